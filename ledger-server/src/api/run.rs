//! Run API Handlers
//!
//! HTTP endpoints behind the ledger client: start, complete, detail, and
//! the run read views.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use ledger_core::domain::run::{PipelineRun, PipelineRunDetail};
use ledger_core::dto::run::{
    AddRunDetail, AddedRunDetail, CompleteRun, CompletedRun, RunFilter, StartRun, StartedRun,
};
use serde::Deserialize;
use sqlx::PgPool;

use crate::api::error::ApiResult;
use crate::service::run_service;

/// Query parameters for GET /runs/{id}/details
#[derive(Debug, Default, Deserialize)]
pub struct RunDetailsQuery {
    #[serde(default)]
    pub latest: bool,
}

/// POST /runs/start
pub async fn start_run(
    State(pool): State<PgPool>,
    Json(req): Json<StartRun>,
) -> ApiResult<(StatusCode, Json<StartedRun>)> {
    tracing::info!(
        "Starting run: tag {} in {}",
        req.pipeline_tag,
        req.environment
    );

    let pipeline_run_id = run_service::start_run(&pool, req).await?;

    Ok((StatusCode::CREATED, Json(StartedRun { pipeline_run_id })))
}

/// POST /runs/{id}/complete
pub async fn complete_run(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
    Json(req): Json<CompleteRun>,
) -> ApiResult<Json<CompletedRun>> {
    tracing::info!("Completing run {}: {}", id, req.outcome);

    let completed = run_service::complete_run(&pool, id, req).await?;

    Ok(Json(CompletedRun { completed }))
}

/// POST /runs/{id}/details
pub async fn add_run_detail(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
    Json(req): Json<AddRunDetail>,
) -> ApiResult<(StatusCode, Json<AddedRunDetail>)> {
    tracing::debug!("Adding {} detail to run {}", req.detail_type, id);

    let detail_id = run_service::add_run_detail(&pool, id, req).await?;

    Ok((StatusCode::CREATED, Json(AddedRunDetail { detail_id })))
}

/// GET /runs
pub async fn list_runs(
    State(pool): State<PgPool>,
    Query(filter): Query<RunFilter>,
) -> ApiResult<Json<Vec<PipelineRun>>> {
    tracing::debug!("Listing runs: {:?}", filter);

    let runs = run_service::list_runs(&pool, filter).await?;

    Ok(Json(runs))
}

/// GET /runs/{id}
pub async fn get_run(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> ApiResult<Json<PipelineRun>> {
    tracing::debug!("Getting run: {}", id);

    let run = run_service::get_run(&pool, id).await?;

    Ok(Json(run))
}

/// GET /runs/{id}/details?latest=
pub async fn list_run_details(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
    Query(query): Query<RunDetailsQuery>,
) -> ApiResult<Json<Vec<PipelineRunDetail>>> {
    tracing::debug!("Getting details for run {} (latest: {})", id, query.latest);

    let details = if query.latest {
        run_service::latest_run_details(&pool, id).await?
    } else {
        run_service::list_run_details(&pool, id).await?
    };

    Ok(Json(details))
}
