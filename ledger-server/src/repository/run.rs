//! Run Repository
//!
//! Handles all database operations for pipeline runs and their details.

use chrono::{DateTime, Utc};
use ledger_core::domain::run::{PipelineRun, PipelineRunDetail, RunStatus};
use ledger_core::dto::run::RunFilter;
use sqlx::{PgPool, Postgres, QueryBuilder};

/// Upper bound on rows returned by a run listing
pub const MAX_RUN_LIMIT: i64 = 1000;

const RUN_SELECT: &str = r#"
    SELECT r.pipeline_run_id, r.pipeline_id, p.pipeline_name,
           r.environment_id, env.common_cd AS env_code,
           st.common_cd AS status, r.start_dt, r.end_dt, r.description
    FROM pipeline_run r
    JOIN pipeline p ON p.pipeline_id = r.pipeline_id
    JOIN pipeline_environment e ON e.environment_id = r.environment_id
    JOIN system_codes env ON env.code_id = e.env_code_id
    JOIN system_codes st ON st.code_id = r.status_id
"#;

const RUN_DETAIL_SELECT: &str = r#"
    SELECT d.detail_id, d.pipeline_run_id, d.detail_type_id, t.common_cd AS detail_type,
           d.detail_data, d.detail_desc, d.created_at
    FROM pipeline_run_details d
    JOIN system_codes t ON t.code_id = d.detail_type_id
"#;

/// Insert a new run with `start_dt = NOW()` and no end time
pub async fn create(
    pool: &PgPool,
    pipeline_id: i64,
    environment_id: i64,
    status_id: i64,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO pipeline_run (pipeline_id, environment_id, status_id, start_dt, end_dt)
        VALUES ($1, $2, $3, NOW(), NULL)
        RETURNING pipeline_run_id
        "#,
    )
    .bind(pipeline_id)
    .bind(environment_id)
    .bind(status_id)
    .fetch_one(pool)
    .await
}

/// Find a run by ID
pub async fn find_by_id(pool: &PgPool, run_id: i64) -> Result<Option<PipelineRun>, sqlx::Error> {
    let row = sqlx::query_as::<_, RunRow>(&format!("{RUN_SELECT} WHERE r.pipeline_run_id = $1"))
        .bind(run_id)
        .fetch_optional(pool)
        .await?;

    row.map(PipelineRun::try_from).transpose()
}

pub async fn exists(pool: &PgPool, run_id: i64) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM pipeline_run WHERE pipeline_run_id = $1)",
    )
    .bind(run_id)
    .fetch_one(pool)
    .await
}

/// List runs matching `filter`, newest first
pub async fn list(pool: &PgPool, filter: &RunFilter) -> Result<Vec<PipelineRun>, sqlx::Error> {
    let mut builder = QueryBuilder::<Postgres>::new(RUN_SELECT);
    builder.push(" WHERE TRUE");

    if let Some(pipeline_id) = filter.pipeline_id {
        builder.push(" AND r.pipeline_id = ").push_bind(pipeline_id);
    }
    if let Some(environment) = &filter.environment {
        builder.push(" AND env.common_cd = ").push_bind(environment.clone());
    }
    if let Some(status) = filter.status {
        builder.push(" AND st.common_cd = ").push_bind(status.as_code());
    }
    if let Some(after) = filter.started_after {
        builder.push(" AND r.start_dt >= ").push_bind(after);
    }
    if let Some(before) = filter.started_before {
        builder.push(" AND r.start_dt < ").push_bind(before);
    }

    builder.push(" ORDER BY r.start_dt DESC, r.pipeline_run_id DESC");
    builder.push(" LIMIT ").push_bind(effective_limit(filter.limit));

    let rows = builder.build_query_as::<RunRow>().fetch_all(pool).await?;

    rows.into_iter().map(PipelineRun::try_from).collect()
}

/// Move a still-open run to a terminal status
///
/// Only one caller can succeed per run: the update matches only while
/// `end_dt` is NULL. Returns false when no open run matched.
pub async fn complete(
    pool: &PgPool,
    run_id: i64,
    status_id: i64,
    description: Option<&str>,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE pipeline_run
        SET status_id = $1, end_dt = NOW(), description = COALESCE($2, description)
        WHERE pipeline_run_id = $3 AND end_dt IS NULL
        "#,
    )
    .bind(status_id)
    .bind(description)
    .bind(run_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}

// =============================================================================
// Run Details
// =============================================================================

/// Append a detail row to a run
pub async fn add_detail(
    pool: &PgPool,
    run_id: i64,
    detail_type_id: i64,
    detail_data: &str,
    detail_desc: Option<&str>,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO pipeline_run_details (pipeline_run_id, detail_type_id, detail_data, detail_desc)
        VALUES ($1, $2, $3, $4)
        RETURNING detail_id
        "#,
    )
    .bind(run_id)
    .bind(detail_type_id)
    .bind(detail_data)
    .bind(detail_desc)
    .fetch_one(pool)
    .await
}

/// Every detail of a run, in insertion order
pub async fn list_details(
    pool: &PgPool,
    run_id: i64,
) -> Result<Vec<PipelineRunDetail>, sqlx::Error> {
    let rows = sqlx::query_as::<_, RunDetailRow>(&format!(
        "{RUN_DETAIL_SELECT} WHERE d.pipeline_run_id = $1 ORDER BY d.detail_id"
    ))
    .bind(run_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(|r| r.into()).collect())
}

/// Most recent detail per type; ties on `created_at` go to the highest id
pub async fn latest_details(
    pool: &PgPool,
    run_id: i64,
) -> Result<Vec<PipelineRunDetail>, sqlx::Error> {
    let rows = sqlx::query_as::<_, RunDetailRow>(
        r#"
        SELECT DISTINCT ON (t.common_cd)
               d.detail_id, d.pipeline_run_id, d.detail_type_id, t.common_cd AS detail_type,
               d.detail_data, d.detail_desc, d.created_at
        FROM pipeline_run_details d
        JOIN system_codes t ON t.code_id = d.detail_type_id
        WHERE d.pipeline_run_id = $1
        ORDER BY t.common_cd, d.created_at DESC, d.detail_id DESC
        "#,
    )
    .bind(run_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(|r| r.into()).collect())
}

// =============================================================================
// Helper Functions
// =============================================================================

fn effective_limit(requested: Option<i64>) -> i64 {
    requested
        .filter(|limit| *limit > 0)
        .map(|limit| limit.min(MAX_RUN_LIMIT))
        .unwrap_or(MAX_RUN_LIMIT)
}

// =============================================================================
// Database Row Types
// =============================================================================

#[derive(sqlx::FromRow)]
struct RunRow {
    pipeline_run_id: i64,
    pipeline_id: i64,
    pipeline_name: String,
    environment_id: i64,
    env_code: String,
    status: String,
    start_dt: DateTime<Utc>,
    end_dt: Option<DateTime<Utc>>,
    description: Option<String>,
}

impl TryFrom<RunRow> for PipelineRun {
    type Error = sqlx::Error;

    fn try_from(row: RunRow) -> Result<Self, Self::Error> {
        let status = RunStatus::from_code(&row.status).ok_or_else(|| sqlx::Error::ColumnDecode {
            index: "status".to_string(),
            source: format!("unknown run status code '{}'", row.status).into(),
        })?;

        Ok(PipelineRun {
            pipeline_run_id: row.pipeline_run_id,
            pipeline_id: row.pipeline_id,
            pipeline_name: row.pipeline_name,
            environment_id: row.environment_id,
            env_code: row.env_code,
            status,
            start_dt: row.start_dt,
            end_dt: row.end_dt,
            description: row.description,
        })
    }
}

#[derive(sqlx::FromRow)]
struct RunDetailRow {
    detail_id: i64,
    pipeline_run_id: i64,
    detail_type_id: i64,
    detail_type: String,
    detail_data: String,
    detail_desc: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<RunDetailRow> for PipelineRunDetail {
    fn from(row: RunDetailRow) -> Self {
        PipelineRunDetail {
            detail_id: row.detail_id,
            pipeline_run_id: row.pipeline_run_id,
            detail_type_id: row.detail_type_id,
            detail_type: row.detail_type,
            detail_data: row.detail_data,
            detail_desc: row.detail_desc,
            created_at: row.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_limit_defaults_and_caps() {
        assert_eq!(effective_limit(None), MAX_RUN_LIMIT);
        assert_eq!(effective_limit(Some(25)), 25);
        assert_eq!(effective_limit(Some(0)), MAX_RUN_LIMIT);
        assert_eq!(effective_limit(Some(-3)), MAX_RUN_LIMIT);
        assert_eq!(effective_limit(Some(50_000)), MAX_RUN_LIMIT);
    }

    #[test]
    fn test_unknown_status_code_fails_decode() {
        let row = RunRow {
            pipeline_run_id: 1,
            pipeline_id: 1,
            pipeline_name: "ingest".to_string(),
            environment_id: 1,
            env_code: "DEV".to_string(),
            status: "PAUSED".to_string(),
            start_dt: Utc::now(),
            end_dt: None,
            description: None,
        };
        assert!(PipelineRun::try_from(row).is_err());
    }
}
