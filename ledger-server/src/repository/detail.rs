//! Pipeline Detail Repository
//!
//! Environment-scoped configuration values of a pipeline.

use ledger_core::domain::pipeline::PipelineDetail;
use sqlx::PgPool;

/// Detail columns with the detail type resolved to an id
#[derive(Debug, Clone)]
pub struct DetailRecord {
    pub environment_id: i64,
    pub detail_type_id: i64,
    pub detail_desc: String,
    pub detail_data: Option<String>,
}

const DETAIL_SELECT: &str = r#"
    SELECT d.detail_id, d.pipeline_id, d.environment_id, env.common_cd AS env_code,
           d.detail_type_id, t.common_cd AS detail_type,
           d.detail_desc, d.detail_data, d.created_at
    FROM pipeline_details d
    JOIN pipeline_environment e ON e.environment_id = d.environment_id
    JOIN system_codes env ON env.code_id = e.env_code_id
    JOIN system_codes t ON t.code_id = d.detail_type_id
"#;

pub async fn create(
    pool: &PgPool,
    pipeline_id: i64,
    record: &DetailRecord,
) -> Result<PipelineDetail, sqlx::Error> {
    let detail_id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO pipeline_details (
            pipeline_id, environment_id, detail_type_id, detail_desc, detail_data
        )
        VALUES ($1, $2, $3, $4, $5)
        RETURNING detail_id
        "#,
    )
    .bind(pipeline_id)
    .bind(record.environment_id)
    .bind(record.detail_type_id)
    .bind(&record.detail_desc)
    .bind(&record.detail_data)
    .fetch_one(pool)
    .await?;

    find_by_id(pool, detail_id)
        .await?
        .ok_or(sqlx::Error::RowNotFound)
}

pub async fn find_by_id(pool: &PgPool, detail_id: i64) -> Result<Option<PipelineDetail>, sqlx::Error> {
    let row = sqlx::query_as::<_, DetailRow>(&format!("{DETAIL_SELECT} WHERE d.detail_id = $1"))
        .bind(detail_id)
        .fetch_optional(pool)
        .await?;

    Ok(row.map(|r| r.into()))
}

pub async fn list_for_pipeline(
    pool: &PgPool,
    pipeline_id: i64,
) -> Result<Vec<PipelineDetail>, sqlx::Error> {
    let rows = sqlx::query_as::<_, DetailRow>(&format!(
        "{DETAIL_SELECT} WHERE d.pipeline_id = $1 ORDER BY env.sort_order, t.common_cd, d.detail_id"
    ))
    .bind(pipeline_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(|r| r.into()).collect())
}

pub async fn update(
    pool: &PgPool,
    detail_id: i64,
    record: &DetailRecord,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE pipeline_details
        SET environment_id = $1, detail_type_id = $2, detail_desc = $3, detail_data = $4
        WHERE detail_id = $5
        "#,
    )
    .bind(record.environment_id)
    .bind(record.detail_type_id)
    .bind(&record.detail_desc)
    .bind(&record.detail_data)
    .bind(detail_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn delete(pool: &PgPool, detail_id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM pipeline_details WHERE detail_id = $1")
        .bind(detail_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

// =============================================================================
// Database Row Types
// =============================================================================

#[derive(sqlx::FromRow)]
struct DetailRow {
    detail_id: i64,
    pipeline_id: i64,
    environment_id: i64,
    env_code: String,
    detail_type_id: i64,
    detail_type: String,
    detail_desc: String,
    detail_data: Option<String>,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl From<DetailRow> for PipelineDetail {
    fn from(row: DetailRow) -> Self {
        PipelineDetail {
            detail_id: row.detail_id,
            pipeline_id: row.pipeline_id,
            environment_id: row.environment_id,
            env_code: row.env_code,
            detail_type_id: row.detail_type_id,
            detail_type: row.detail_type,
            detail_desc: row.detail_desc,
            detail_data: row.detail_data,
            created_at: row.created_at,
        }
    }
}
