//! Pipeline Environment Repository
//!
//! Bindings between a pipeline and the environments it runs in.

use ledger_core::domain::pipeline::PipelineEnvironment;
use sqlx::PgPool;

const ENVIRONMENT_SELECT: &str = r#"
    SELECT e.environment_id, e.pipeline_id, e.env_code_id,
           c.common_cd AS env_code, e.created_at
    FROM pipeline_environment e
    JOIN system_codes c ON c.code_id = e.env_code_id
"#;

/// Bind a pipeline to an environment code
///
/// Fails with a unique violation when the binding already exists.
pub async fn create(
    pool: &PgPool,
    pipeline_id: i64,
    env_code_id: i64,
) -> Result<PipelineEnvironment, sqlx::Error> {
    let environment_id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO pipeline_environment (pipeline_id, env_code_id)
        VALUES ($1, $2)
        RETURNING environment_id
        "#,
    )
    .bind(pipeline_id)
    .bind(env_code_id)
    .fetch_one(pool)
    .await?;

    find_by_id(pool, environment_id)
        .await?
        .ok_or(sqlx::Error::RowNotFound)
}

pub async fn find_by_id(
    pool: &PgPool,
    environment_id: i64,
) -> Result<Option<PipelineEnvironment>, sqlx::Error> {
    let row = sqlx::query_as::<_, EnvironmentRow>(&format!(
        "{ENVIRONMENT_SELECT} WHERE e.environment_id = $1"
    ))
    .bind(environment_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|r| r.into()))
}

pub async fn list_for_pipeline(
    pool: &PgPool,
    pipeline_id: i64,
) -> Result<Vec<PipelineEnvironment>, sqlx::Error> {
    let rows = sqlx::query_as::<_, EnvironmentRow>(&format!(
        "{ENVIRONMENT_SELECT} WHERE e.pipeline_id = $1 ORDER BY c.sort_order, c.common_cd"
    ))
    .bind(pipeline_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(|r| r.into()).collect())
}

/// Binding of `pipeline_id` for the environment with common code `env_code`
pub async fn find_for_code(
    pool: &PgPool,
    pipeline_id: i64,
    env_code: &str,
) -> Result<Option<i64>, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        r#"
        SELECT e.environment_id
        FROM pipeline_environment e
        JOIN system_codes c ON c.code_id = e.env_code_id
        WHERE e.pipeline_id = $1
          AND c.code_type_cd = 'PIPELINE_ENVIRONMENT'
          AND c.common_cd = $2
        "#,
    )
    .bind(pipeline_id)
    .bind(env_code)
    .fetch_optional(pool)
    .await
}

/// Remove a binding with its details and runs in one transaction
pub async fn delete_cascade(pool: &PgPool, environment_id: i64) -> Result<bool, sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        DELETE FROM pipeline_run_details
        WHERE pipeline_run_id IN (
            SELECT pipeline_run_id FROM pipeline_run WHERE environment_id = $1
        )
        "#,
    )
    .bind(environment_id)
    .execute(&mut *tx)
    .await?;

    sqlx::query("DELETE FROM pipeline_run WHERE environment_id = $1")
        .bind(environment_id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("DELETE FROM pipeline_details WHERE environment_id = $1")
        .bind(environment_id)
        .execute(&mut *tx)
        .await?;

    let result = sqlx::query("DELETE FROM pipeline_environment WHERE environment_id = $1")
        .bind(environment_id)
        .execute(&mut *tx)
        .await?;

    if result.rows_affected() == 0 {
        tx.rollback().await?;
        return Ok(false);
    }

    tx.commit().await?;
    Ok(true)
}

// =============================================================================
// Database Row Types
// =============================================================================

#[derive(sqlx::FromRow)]
struct EnvironmentRow {
    environment_id: i64,
    pipeline_id: i64,
    env_code_id: i64,
    env_code: String,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl From<EnvironmentRow> for PipelineEnvironment {
    fn from(row: EnvironmentRow) -> Self {
        PipelineEnvironment {
            environment_id: row.environment_id,
            pipeline_id: row.pipeline_id,
            env_code_id: row.env_code_id,
            env_code: row.env_code,
            created_at: row.created_at,
        }
    }
}
