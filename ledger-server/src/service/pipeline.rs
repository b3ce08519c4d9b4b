//! Pipeline Service
//!
//! Business logic for the pipeline catalog: definitions, environment
//! bindings and environment-scoped configuration details.

use ledger_core::domain::code::{code_types, normalize_code};
use ledger_core::domain::pipeline::{Pipeline, PipelineDetail, PipelineEnvironment};
use ledger_core::dto::pipeline::{
    CreateEnvironment, CreatePipeline, CreatePipelineDetail, PipelineSummary,
};
use sqlx::PgPool;

use crate::db;
use crate::repository::code_repository;
use crate::repository::detail::DetailRecord;
use crate::repository::pipeline::PipelineRecord;
use crate::repository::{detail_repository, environment_repository, pipeline_repository};

const MAX_NAME_LEN: usize = 255;
const MAX_TAG_LEN: usize = 255;

/// Service error type
#[derive(Debug)]
pub enum PipelineError {
    NotFound(String),
    UnknownCode(String),
    DuplicateEnvironment { pipeline_id: i64, env_code: String },
    ValidationError(String),
    DatabaseError(sqlx::Error),
}

impl From<sqlx::Error> for PipelineError {
    fn from(err: sqlx::Error) -> Self {
        PipelineError::DatabaseError(err)
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;

/// Create a new pipeline
pub async fn create_pipeline(pool: &PgPool, req: CreatePipeline) -> Result<Pipeline> {
    let req = normalize_pipeline_request(req);
    validate_pipeline_request(&req)?;

    let record = to_record(pool, req).await?;
    let pipeline = pipeline_repository::create(pool, &record).await?;

    tracing::info!(
        "Pipeline created: {} ({})",
        pipeline.pipeline_name,
        pipeline.pipeline_id
    );

    Ok(pipeline)
}

/// Get a pipeline by ID
pub async fn get_pipeline(pool: &PgPool, pipeline_id: i64) -> Result<Pipeline> {
    pipeline_repository::find_by_id(pool, pipeline_id)
        .await?
        .ok_or_else(|| pipeline_not_found(pipeline_id))
}

/// List all pipelines with their run counts
pub async fn list_pipelines(pool: &PgPool) -> Result<Vec<PipelineSummary>> {
    Ok(pipeline_repository::list_summaries(pool).await?)
}

/// Update a pipeline
pub async fn update_pipeline(
    pool: &PgPool,
    pipeline_id: i64,
    req: CreatePipeline,
) -> Result<Pipeline> {
    let req = normalize_pipeline_request(req);
    validate_pipeline_request(&req)?;

    let record = to_record(pool, req).await?;

    if !pipeline_repository::update(pool, pipeline_id, &record).await? {
        return Err(pipeline_not_found(pipeline_id));
    }

    tracing::info!("Pipeline updated: {}", pipeline_id);

    get_pipeline(pool, pipeline_id).await
}

/// Delete a pipeline together with its runs, details and environments
pub async fn delete_pipeline(pool: &PgPool, pipeline_id: i64) -> Result<()> {
    if !pipeline_repository::delete_cascade(pool, pipeline_id).await? {
        return Err(pipeline_not_found(pipeline_id));
    }

    tracing::info!("Pipeline deleted: {}", pipeline_id);

    Ok(())
}

// =============================================================================
// Environments
// =============================================================================

/// Bind a pipeline to an environment
pub async fn add_environment(
    pool: &PgPool,
    pipeline_id: i64,
    req: CreateEnvironment,
) -> Result<PipelineEnvironment> {
    let env_code = normalize_code(&req.env_code);
    if env_code.is_empty() {
        return Err(PipelineError::ValidationError(
            "Environment code cannot be empty".to_string(),
        ));
    }

    ensure_pipeline_exists(pool, pipeline_id).await?;
    let env_code_id = resolve(pool, code_types::PIPELINE_ENVIRONMENT, &env_code).await?;

    let environment = environment_repository::create(pool, pipeline_id, env_code_id)
        .await
        .map_err(|e| {
            if db::is_unique_violation(&e) {
                PipelineError::DuplicateEnvironment {
                    pipeline_id,
                    env_code: env_code.clone(),
                }
            } else {
                PipelineError::DatabaseError(e)
            }
        })?;

    tracing::info!(
        "Pipeline {} bound to environment {} ({})",
        pipeline_id,
        environment.env_code,
        environment.environment_id
    );

    Ok(environment)
}

pub async fn list_environments(
    pool: &PgPool,
    pipeline_id: i64,
) -> Result<Vec<PipelineEnvironment>> {
    ensure_pipeline_exists(pool, pipeline_id).await?;
    Ok(environment_repository::list_for_pipeline(pool, pipeline_id).await?)
}

/// Unbind an environment, removing its details and runs
pub async fn remove_environment(pool: &PgPool, environment_id: i64) -> Result<()> {
    if !environment_repository::delete_cascade(pool, environment_id).await? {
        return Err(PipelineError::NotFound(format!(
            "Environment {} not found",
            environment_id
        )));
    }

    tracing::info!("Environment removed: {}", environment_id);

    Ok(())
}

// =============================================================================
// Details
// =============================================================================

pub async fn add_detail(
    pool: &PgPool,
    pipeline_id: i64,
    req: CreatePipelineDetail,
) -> Result<PipelineDetail> {
    validate_detail_request(&req)?;
    ensure_pipeline_exists(pool, pipeline_id).await?;

    let record = to_detail_record(pool, pipeline_id, req).await?;
    let detail = detail_repository::create(pool, pipeline_id, &record).await?;

    tracing::info!(
        "Detail {} added to pipeline {} ({})",
        detail.detail_type,
        pipeline_id,
        detail.detail_id
    );

    Ok(detail)
}

pub async fn list_details(pool: &PgPool, pipeline_id: i64) -> Result<Vec<PipelineDetail>> {
    ensure_pipeline_exists(pool, pipeline_id).await?;
    Ok(detail_repository::list_for_pipeline(pool, pipeline_id).await?)
}

pub async fn update_detail(
    pool: &PgPool,
    detail_id: i64,
    req: CreatePipelineDetail,
) -> Result<PipelineDetail> {
    validate_detail_request(&req)?;

    let existing = detail_repository::find_by_id(pool, detail_id)
        .await?
        .ok_or_else(|| detail_not_found(detail_id))?;

    let record = to_detail_record(pool, existing.pipeline_id, req).await?;

    if !detail_repository::update(pool, detail_id, &record).await? {
        return Err(detail_not_found(detail_id));
    }

    tracing::info!("Detail updated: {}", detail_id);

    detail_repository::find_by_id(pool, detail_id)
        .await?
        .ok_or_else(|| detail_not_found(detail_id))
}

pub async fn delete_detail(pool: &PgPool, detail_id: i64) -> Result<()> {
    if !detail_repository::delete(pool, detail_id).await? {
        return Err(detail_not_found(detail_id));
    }

    tracing::info!("Detail deleted: {}", detail_id);

    Ok(())
}

// =============================================================================
// Helper Functions
// =============================================================================

fn pipeline_not_found(pipeline_id: i64) -> PipelineError {
    PipelineError::NotFound(format!("Pipeline {} not found", pipeline_id))
}

fn detail_not_found(detail_id: i64) -> PipelineError {
    PipelineError::NotFound(format!("Detail {} not found", detail_id))
}

async fn ensure_pipeline_exists(pool: &PgPool, pipeline_id: i64) -> Result<()> {
    if pipeline_repository::exists(pool, pipeline_id).await? {
        Ok(())
    } else {
        Err(pipeline_not_found(pipeline_id))
    }
}

async fn resolve(pool: &PgPool, code_type: &str, common_cd: &str) -> Result<i64> {
    let common_cd = normalize_code(common_cd);

    code_repository::resolve_active(pool, code_type, &common_cd)
        .await?
        .ok_or_else(|| PipelineError::UnknownCode(format!("{}/{}", code_type, common_cd)))
}

/// Resolve a pipeline attribute code; an unresolvable value is invalid input
async fn resolve_attribute(pool: &PgPool, code_type: &str, common_cd: &str) -> Result<i64> {
    resolve(pool, code_type, common_cd)
        .await
        .map_err(|e| match e {
            PipelineError::UnknownCode(code) => {
                PipelineError::ValidationError(format!("Unknown or inactive code {}", code))
            }
            other => other,
        })
}

async fn to_record(pool: &PgPool, req: CreatePipeline) -> Result<PipelineRecord> {
    let pipeline_type_id =
        resolve_attribute(pool, code_types::PIPELINE_TYPE, &req.pipeline_type).await?;
    let pipeline_status_id =
        resolve_attribute(pool, code_types::PIPELINE_STATUS, &req.pipeline_status).await?;

    Ok(PipelineRecord {
        pipeline_name: req.pipeline_name,
        pipeline_type_id,
        pipeline_status_id,
        description: req.description,
        tag: req.tag,
        is_active: req.is_active,
    })
}

/// Resolve a detail request, checking its environment belongs to `pipeline_id`
async fn to_detail_record(
    pool: &PgPool,
    pipeline_id: i64,
    req: CreatePipelineDetail,
) -> Result<DetailRecord> {
    let environment = environment_repository::find_by_id(pool, req.environment_id)
        .await?
        .ok_or_else(|| {
            PipelineError::NotFound(format!("Environment {} not found", req.environment_id))
        })?;

    if environment.pipeline_id != pipeline_id {
        return Err(PipelineError::ValidationError(format!(
            "Environment {} does not belong to pipeline {}",
            req.environment_id, pipeline_id
        )));
    }

    let detail_type_id =
        resolve(pool, code_types::PIPELINE_RUN_DETAIL_TYPE, &req.detail_type).await?;

    Ok(DetailRecord {
        environment_id: req.environment_id,
        detail_type_id,
        detail_desc: req.detail_desc.trim().to_string(),
        detail_data: req.detail_data,
    })
}

/// Trim free text and turn blank optionals into `None`
fn normalize_pipeline_request(req: CreatePipeline) -> CreatePipeline {
    fn non_blank(value: Option<String>) -> Option<String> {
        value
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    CreatePipeline {
        pipeline_name: req.pipeline_name.trim().to_string(),
        description: non_blank(req.description),
        tag: non_blank(req.tag),
        ..req
    }
}

// =============================================================================
// Validation
// =============================================================================

fn validate_pipeline_request(req: &CreatePipeline) -> Result<()> {
    if req.pipeline_name.trim().is_empty() {
        return Err(PipelineError::ValidationError(
            "Pipeline name cannot be empty".to_string(),
        ));
    }

    if req.pipeline_name.len() > MAX_NAME_LEN {
        return Err(PipelineError::ValidationError(format!(
            "Pipeline name is too long (max {} characters)",
            MAX_NAME_LEN
        )));
    }

    if req.tag.as_ref().is_some_and(|tag| tag.len() > MAX_TAG_LEN) {
        return Err(PipelineError::ValidationError(format!(
            "Pipeline tag is too long (max {} characters)",
            MAX_TAG_LEN
        )));
    }

    if req.pipeline_type.trim().is_empty() || req.pipeline_status.trim().is_empty() {
        return Err(PipelineError::ValidationError(
            "Pipeline type and status are required".to_string(),
        ));
    }

    Ok(())
}

fn validate_detail_request(req: &CreatePipelineDetail) -> Result<()> {
    if req.detail_desc.trim().is_empty() {
        return Err(PipelineError::ValidationError(
            "Detail description cannot be empty".to_string(),
        ));
    }

    if req.detail_type.trim().is_empty() {
        return Err(PipelineError::ValidationError(
            "Detail type cannot be empty".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(name: &str, tag: Option<&str>) -> CreatePipeline {
        CreatePipeline {
            pipeline_name: name.to_string(),
            pipeline_type: "BATCH".to_string(),
            pipeline_status: "ACTIVE".to_string(),
            description: None,
            tag: tag.map(str::to_string),
            is_active: true,
        }
    }

    #[test]
    fn test_validate_empty_name() {
        let result = validate_pipeline_request(&request("   ", None));
        assert!(matches!(result, Err(PipelineError::ValidationError(_))));
    }

    #[test]
    fn test_validate_long_name() {
        let result = validate_pipeline_request(&request(&"n".repeat(256), None));
        assert!(matches!(result, Err(PipelineError::ValidationError(_))));
    }

    #[test]
    fn test_validate_long_tag() {
        let tag = "t".repeat(256);
        let result = validate_pipeline_request(&request("ingest_orders", Some(&tag)));
        assert!(matches!(result, Err(PipelineError::ValidationError(_))));
    }

    #[test]
    fn test_validate_valid_request() {
        let result = validate_pipeline_request(&request("ingest_orders", Some("orders")));
        assert!(result.is_ok());
    }

    #[test]
    fn test_blank_tag_normalized_to_none() {
        let req = normalize_pipeline_request(request(" ingest_orders ", Some("   ")));
        assert_eq!(req.pipeline_name, "ingest_orders");
        assert_eq!(req.tag, None);
    }

    #[test]
    fn test_validate_detail_requires_description() {
        let req = CreatePipelineDetail {
            environment_id: 1,
            detail_type: "CLOUDWATCH_LOG_LINK".to_string(),
            detail_desc: " ".to_string(),
            detail_data: Some("https://logs".to_string()),
        };
        assert!(matches!(
            validate_detail_request(&req),
            Err(PipelineError::ValidationError(_))
        ));
    }
}
