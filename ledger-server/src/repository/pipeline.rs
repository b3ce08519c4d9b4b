//! Pipeline Repository
//!
//! Handles all database operations related to pipeline definitions.

use ledger_core::domain::pipeline::Pipeline;
use ledger_core::dto::pipeline::PipelineSummary;
use sqlx::PgPool;

/// Pipeline columns with type and status codes already resolved to ids
#[derive(Debug, Clone)]
pub struct PipelineRecord {
    pub pipeline_name: String,
    pub pipeline_type_id: i64,
    pub pipeline_status_id: i64,
    pub description: Option<String>,
    pub tag: Option<String>,
    pub is_active: bool,
}

const PIPELINE_SELECT: &str = r#"
    SELECT p.pipeline_id, p.pipeline_name,
           p.pipeline_type_id, t.common_cd AS pipeline_type,
           p.pipeline_status_id, s.common_cd AS pipeline_status,
           p.description, p.tag, p.is_active, p.created_at
    FROM pipeline p
    JOIN system_codes t ON t.code_id = p.pipeline_type_id
    JOIN system_codes s ON s.code_id = p.pipeline_status_id
"#;

/// Create a new pipeline in the database
pub async fn create(pool: &PgPool, record: &PipelineRecord) -> Result<Pipeline, sqlx::Error> {
    let pipeline_id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO pipeline (
            pipeline_name, pipeline_type_id, pipeline_status_id, description, tag, is_active
        )
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING pipeline_id
        "#,
    )
    .bind(&record.pipeline_name)
    .bind(record.pipeline_type_id)
    .bind(record.pipeline_status_id)
    .bind(&record.description)
    .bind(&record.tag)
    .bind(record.is_active)
    .fetch_one(pool)
    .await?;

    find_by_id(pool, pipeline_id)
        .await?
        .ok_or(sqlx::Error::RowNotFound)
}

/// Find a pipeline by ID
pub async fn find_by_id(pool: &PgPool, pipeline_id: i64) -> Result<Option<Pipeline>, sqlx::Error> {
    let row = sqlx::query_as::<_, PipelineRow>(&format!(
        "{PIPELINE_SELECT} WHERE p.pipeline_id = $1"
    ))
    .bind(pipeline_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|r| r.into()))
}

pub async fn exists(pool: &PgPool, pipeline_id: i64) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM pipeline WHERE pipeline_id = $1)")
        .bind(pipeline_id)
        .fetch_one(pool)
        .await
}

/// List all pipelines by name, each with its total run count
pub async fn list_summaries(pool: &PgPool) -> Result<Vec<PipelineSummary>, sqlx::Error> {
    let rows = sqlx::query_as::<_, PipelineSummaryRow>(&format!(
        r#"
        SELECT q.*, COALESCE(rc.run_count, 0) AS run_count
        FROM ({PIPELINE_SELECT}) q
        LEFT JOIN (
            SELECT pipeline_id, COUNT(*) AS run_count
            FROM pipeline_run
            GROUP BY pipeline_id
        ) rc ON rc.pipeline_id = q.pipeline_id
        ORDER BY q.pipeline_name, q.pipeline_id
        "#
    ))
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|r| {
            let run_count = r.run_count;
            PipelineSummary::from_pipeline(r.pipeline.into(), run_count)
        })
        .collect())
}

/// IDs of active pipelines carrying `tag`
///
/// At most two are returned; callers only need to tell one from many.
pub async fn find_active_ids_by_tag(pool: &PgPool, tag: &str) -> Result<Vec<i64>, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        r#"
        SELECT pipeline_id
        FROM pipeline
        WHERE tag = $1 AND is_active
        ORDER BY pipeline_id
        LIMIT 2
        "#,
    )
    .bind(tag)
    .fetch_all(pool)
    .await
}

/// Update a pipeline
pub async fn update(
    pool: &PgPool,
    pipeline_id: i64,
    record: &PipelineRecord,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE pipeline
        SET pipeline_name = $1, pipeline_type_id = $2, pipeline_status_id = $3,
            description = $4, tag = $5, is_active = $6
        WHERE pipeline_id = $7
        "#,
    )
    .bind(&record.pipeline_name)
    .bind(record.pipeline_type_id)
    .bind(record.pipeline_status_id)
    .bind(&record.description)
    .bind(&record.tag)
    .bind(record.is_active)
    .bind(pipeline_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Delete a pipeline and everything it owns in one transaction
///
/// Order: run details, runs, pipeline details, environments, pipeline.
/// Returns false (and changes nothing) when the pipeline does not exist.
pub async fn delete_cascade(pool: &PgPool, pipeline_id: i64) -> Result<bool, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let locked = sqlx::query_scalar::<_, i64>(
        "SELECT pipeline_id FROM pipeline WHERE pipeline_id = $1 FOR UPDATE",
    )
    .bind(pipeline_id)
    .fetch_optional(&mut *tx)
    .await?;

    if locked.is_none() {
        tx.rollback().await?;
        return Ok(false);
    }

    let run_details = sqlx::query(
        r#"
        DELETE FROM pipeline_run_details
        WHERE pipeline_run_id IN (SELECT pipeline_run_id FROM pipeline_run WHERE pipeline_id = $1)
        "#,
    )
    .bind(pipeline_id)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    let runs = sqlx::query("DELETE FROM pipeline_run WHERE pipeline_id = $1")
        .bind(pipeline_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    let details = sqlx::query("DELETE FROM pipeline_details WHERE pipeline_id = $1")
        .bind(pipeline_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    let environments = sqlx::query("DELETE FROM pipeline_environment WHERE pipeline_id = $1")
        .bind(pipeline_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    sqlx::query("DELETE FROM pipeline WHERE pipeline_id = $1")
        .bind(pipeline_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    tracing::debug!(
        "Cascade removed {} run details, {} runs, {} details, {} environments for pipeline {}",
        run_details,
        runs,
        details,
        environments,
        pipeline_id
    );

    Ok(true)
}

// =============================================================================
// Database Row Types
// =============================================================================

#[derive(sqlx::FromRow)]
struct PipelineRow {
    pipeline_id: i64,
    pipeline_name: String,
    pipeline_type_id: i64,
    pipeline_type: String,
    pipeline_status_id: i64,
    pipeline_status: String,
    description: Option<String>,
    tag: Option<String>,
    is_active: bool,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl From<PipelineRow> for Pipeline {
    fn from(row: PipelineRow) -> Self {
        Pipeline {
            pipeline_id: row.pipeline_id,
            pipeline_name: row.pipeline_name,
            pipeline_type_id: row.pipeline_type_id,
            pipeline_type: row.pipeline_type,
            pipeline_status_id: row.pipeline_status_id,
            pipeline_status: row.pipeline_status,
            description: row.description,
            tag: row.tag,
            is_active: row.is_active,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct PipelineSummaryRow {
    #[sqlx(flatten)]
    pipeline: PipelineRow,
    run_count: i64,
}
