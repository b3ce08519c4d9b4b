//! Run Service
//!
//! Business logic behind the ledger client calls: starting a run by
//! pipeline tag, completing it exactly once, and appending run details.

use ledger_core::domain::code::{code_types, normalize_code};
use ledger_core::domain::run::{PipelineRun, PipelineRunDetail, RunStatus};
use ledger_core::dto::run::{AddRunDetail, CompleteRun, RunFilter, StartRun};
use sqlx::PgPool;

use crate::db;
use crate::repository::{code_repository, environment_repository, pipeline_repository, run_repository};

/// Service error type
#[derive(Debug)]
pub enum RunError {
    NotFound(i64),
    UnknownCode(String),
    UnknownPipelineTag(String),
    AmbiguousPipelineTag(String),
    EnvironmentNotBound { pipeline_tag: String, environment: String },
    InvalidStateTransition { run_id: i64, from: RunStatus, to: RunStatus },
    ValidationError(String),
    DatabaseError(sqlx::Error),
}

impl From<sqlx::Error> for RunError {
    fn from(err: sqlx::Error) -> Self {
        RunError::DatabaseError(err)
    }
}

pub type Result<T> = std::result::Result<T, RunError>;

/// Start a new run of the active pipeline carrying `pipeline_tag`
///
/// Every call creates a new run, even for the same tag and environment.
pub async fn start_run(pool: &PgPool, req: StartRun) -> Result<i64> {
    let (environment, pipeline_tag) = validate_start_request(&req)?;

    let pipeline_ids = pipeline_repository::find_active_ids_by_tag(pool, &pipeline_tag).await?;
    let pipeline_id = match pipeline_ids.as_slice() {
        [] => return Err(RunError::UnknownPipelineTag(pipeline_tag)),
        [id] => *id,
        _ => return Err(RunError::AmbiguousPipelineTag(pipeline_tag)),
    };

    let environment_id = environment_repository::find_for_code(pool, pipeline_id, &environment)
        .await?
        .ok_or_else(|| RunError::EnvironmentNotBound {
            pipeline_tag: pipeline_tag.clone(),
            environment: environment.clone(),
        })?;

    let status_id = resolve_status(pool, RunStatus::Running).await?;
    let run_id = run_repository::create(pool, pipeline_id, environment_id, status_id)
        .await
        .map_err(|e| {
            // Pipeline or binding removed after resolution
            if db::is_foreign_key_violation(&e) {
                RunError::UnknownPipelineTag(pipeline_tag.clone())
            } else {
                RunError::DatabaseError(e)
            }
        })?;

    tracing::info!(
        "Run {} started for pipeline {} (tag {}, environment {})",
        run_id,
        pipeline_id,
        pipeline_tag,
        environment
    );

    Ok(run_id)
}

/// Move a run to its terminal status
///
/// Exactly one caller succeeds per run; later or concurrent callers get
/// `InvalidStateTransition`.
pub async fn complete_run(pool: &PgPool, run_id: i64, req: CompleteRun) -> Result<bool> {
    let target = req.outcome.terminal_status();
    let description = req
        .description
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty());

    let status_id = resolve_status(pool, target).await?;

    if run_repository::complete(pool, run_id, status_id, description).await? {
        tracing::info!("Run {} completed as {}", run_id, target);
        return Ok(true);
    }

    // Nothing matched: either the run is missing or already terminal
    match run_repository::find_by_id(pool, run_id).await? {
        None => Err(RunError::NotFound(run_id)),
        Some(run) => {
            tracing::warn!(
                "Rejected completion of run {}: already {}",
                run_id,
                run.status
            );
            Err(RunError::InvalidStateTransition {
                run_id,
                from: run.status,
                to: target,
            })
        }
    }
}

/// Append a detail row to a run
///
/// Details may be added after the run has completed.
pub async fn add_run_detail(pool: &PgPool, run_id: i64, req: AddRunDetail) -> Result<i64> {
    let detail_type = normalize_code(&req.detail_type);
    if detail_type.is_empty() {
        return Err(RunError::ValidationError(
            "Detail type cannot be empty".to_string(),
        ));
    }

    if !run_repository::exists(pool, run_id).await? {
        return Err(RunError::NotFound(run_id));
    }

    let detail_type_id = resolve(pool, code_types::PIPELINE_RUN_DETAIL_TYPE, &detail_type).await?;

    let detail_id = run_repository::add_detail(
        pool,
        run_id,
        detail_type_id,
        &req.detail_data,
        req.detail_desc.as_deref(),
    )
    .await
    .map_err(|e| {
        if db::is_foreign_key_violation(&e) {
            RunError::NotFound(run_id)
        } else {
            RunError::DatabaseError(e)
        }
    })?;

    tracing::debug!("Run {} detail {} added ({})", run_id, detail_type, detail_id);

    Ok(detail_id)
}

/// Get a run by ID
pub async fn get_run(pool: &PgPool, run_id: i64) -> Result<PipelineRun> {
    run_repository::find_by_id(pool, run_id)
        .await?
        .ok_or(RunError::NotFound(run_id))
}

pub async fn list_runs(pool: &PgPool, filter: RunFilter) -> Result<Vec<PipelineRun>> {
    let filter = normalize_filter(filter)?;
    Ok(run_repository::list(pool, &filter).await?)
}

/// Every detail of a run, in insertion order
pub async fn list_run_details(pool: &PgPool, run_id: i64) -> Result<Vec<PipelineRunDetail>> {
    ensure_run_exists(pool, run_id).await?;
    Ok(run_repository::list_details(pool, run_id).await?)
}

/// One detail per type, latest wins
pub async fn latest_run_details(pool: &PgPool, run_id: i64) -> Result<Vec<PipelineRunDetail>> {
    ensure_run_exists(pool, run_id).await?;
    Ok(run_repository::latest_details(pool, run_id).await?)
}

// =============================================================================
// Helper Functions
// =============================================================================

async fn ensure_run_exists(pool: &PgPool, run_id: i64) -> Result<()> {
    if run_repository::exists(pool, run_id).await? {
        Ok(())
    } else {
        Err(RunError::NotFound(run_id))
    }
}

/// Run statuses are owned by the state machine and resolve even when inactive
async fn resolve_status(pool: &PgPool, status: RunStatus) -> Result<i64> {
    code_repository::find_id(pool, code_types::STATUS, status.as_code())
        .await?
        .ok_or_else(|| RunError::UnknownCode(format!("{}/{}", code_types::STATUS, status)))
}

async fn resolve(pool: &PgPool, code_type: &str, common_cd: &str) -> Result<i64> {
    code_repository::resolve_active(pool, code_type, common_cd)
        .await?
        .ok_or_else(|| RunError::UnknownCode(format!("{}/{}", code_type, common_cd)))
}

// =============================================================================
// Validation
// =============================================================================

/// Returns the normalized `(environment, pipeline_tag)` pair
fn validate_start_request(req: &StartRun) -> Result<(String, String)> {
    let environment = normalize_code(&req.environment);
    if environment.is_empty() {
        return Err(RunError::ValidationError(
            "Environment cannot be empty".to_string(),
        ));
    }

    let pipeline_tag = req.pipeline_tag.trim().to_string();
    if pipeline_tag.is_empty() {
        return Err(RunError::ValidationError(
            "Pipeline tag cannot be empty".to_string(),
        ));
    }

    Ok((environment, pipeline_tag))
}

fn normalize_filter(filter: RunFilter) -> Result<RunFilter> {
    if let (Some(after), Some(before)) = (filter.started_after, filter.started_before) {
        if after > before {
            return Err(RunError::ValidationError(
                "started_after must not be later than started_before".to_string(),
            ));
        }
    }

    Ok(RunFilter {
        environment: filter
            .environment
            .map(|env| normalize_code(&env))
            .filter(|env| !env.is_empty()),
        ..filter
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    #[test]
    fn test_validate_start_normalizes_environment() {
        let req = StartRun {
            environment: " prod ".to_string(),
            pipeline_tag: " orders ".to_string(),
        };

        let (environment, tag) = validate_start_request(&req).unwrap();
        assert_eq!(environment, "PROD");
        assert_eq!(tag, "orders");
    }

    #[test]
    fn test_validate_start_rejects_blank_tag() {
        let req = StartRun {
            environment: "dev".to_string(),
            pipeline_tag: "  ".to_string(),
        };
        assert!(matches!(
            validate_start_request(&req),
            Err(RunError::ValidationError(_))
        ));
    }

    #[test]
    fn test_validate_start_rejects_blank_environment() {
        let req = StartRun {
            environment: String::new(),
            pipeline_tag: "orders".to_string(),
        };
        assert!(matches!(
            validate_start_request(&req),
            Err(RunError::ValidationError(_))
        ));
    }

    #[test]
    fn test_filter_rejects_inverted_range() {
        let now = Utc::now();
        let filter = RunFilter {
            started_after: Some(now),
            started_before: Some(now - Duration::days(1)),
            ..Default::default()
        };
        assert!(matches!(
            normalize_filter(filter),
            Err(RunError::ValidationError(_))
        ));
    }

    #[test]
    fn test_filter_normalizes_environment() {
        let filter = RunFilter {
            environment: Some("dev".to_string()),
            ..Default::default()
        };
        assert_eq!(
            normalize_filter(filter).unwrap().environment.as_deref(),
            Some("DEV")
        );

        let blank = RunFilter {
            environment: Some("  ".to_string()),
            ..Default::default()
        };
        assert!(normalize_filter(blank).unwrap().environment.is_none());
    }
}
