//! Pipeline API Handlers
//!
//! HTTP endpoints for the pipeline catalog.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use ledger_core::domain::pipeline::{Pipeline, PipelineDetail, PipelineEnvironment};
use ledger_core::dto::pipeline::{
    CreateEnvironment, CreatePipeline, CreatePipelineDetail, PipelineSummary,
};
use sqlx::PgPool;

use crate::api::error::ApiResult;
use crate::service::pipeline_service;

/// POST /pipelines
pub async fn create_pipeline(
    State(pool): State<PgPool>,
    Json(req): Json<CreatePipeline>,
) -> ApiResult<(StatusCode, Json<Pipeline>)> {
    tracing::info!("Creating pipeline: {}", req.pipeline_name);

    let pipeline = pipeline_service::create_pipeline(&pool, req).await?;

    Ok((StatusCode::CREATED, Json(pipeline)))
}

/// GET /pipelines
pub async fn list_pipelines(State(pool): State<PgPool>) -> ApiResult<Json<Vec<PipelineSummary>>> {
    tracing::debug!("Listing all pipelines");

    let pipelines = pipeline_service::list_pipelines(&pool).await?;

    Ok(Json(pipelines))
}

/// GET /pipelines/{id}
pub async fn get_pipeline(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Pipeline>> {
    tracing::debug!("Getting pipeline: {}", id);

    let pipeline = pipeline_service::get_pipeline(&pool, id).await?;

    Ok(Json(pipeline))
}

/// PUT /pipelines/{id}
pub async fn update_pipeline(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
    Json(req): Json<CreatePipeline>,
) -> ApiResult<Json<Pipeline>> {
    tracing::info!("Updating pipeline: {}", id);

    let pipeline = pipeline_service::update_pipeline(&pool, id, req).await?;

    Ok(Json(pipeline))
}

/// DELETE /pipelines/{id}
/// Cascades to runs, run details, pipeline details and environments
pub async fn delete_pipeline(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    tracing::info!("Deleting pipeline: {}", id);

    pipeline_service::delete_pipeline(&pool, id).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// POST /pipelines/{id}/environments
pub async fn add_environment(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
    Json(req): Json<CreateEnvironment>,
) -> ApiResult<(StatusCode, Json<PipelineEnvironment>)> {
    tracing::info!("Binding pipeline {} to environment {}", id, req.env_code);

    let environment = pipeline_service::add_environment(&pool, id, req).await?;

    Ok((StatusCode::CREATED, Json(environment)))
}

/// GET /pipelines/{id}/environments
pub async fn list_environments(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Vec<PipelineEnvironment>>> {
    tracing::debug!("Listing environments for pipeline: {}", id);

    let environments = pipeline_service::list_environments(&pool, id).await?;

    Ok(Json(environments))
}

/// DELETE /environments/{id}
pub async fn remove_environment(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    tracing::info!("Removing environment: {}", id);

    pipeline_service::remove_environment(&pool, id).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// POST /pipelines/{id}/details
pub async fn add_detail(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
    Json(req): Json<CreatePipelineDetail>,
) -> ApiResult<(StatusCode, Json<PipelineDetail>)> {
    tracing::info!("Adding {} detail to pipeline {}", req.detail_type, id);

    let detail = pipeline_service::add_detail(&pool, id, req).await?;

    Ok((StatusCode::CREATED, Json(detail)))
}

/// GET /pipelines/{id}/details
pub async fn list_details(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Vec<PipelineDetail>>> {
    tracing::debug!("Listing details for pipeline: {}", id);

    let details = pipeline_service::list_details(&pool, id).await?;

    Ok(Json(details))
}

/// PUT /details/{id}
pub async fn update_detail(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
    Json(req): Json<CreatePipelineDetail>,
) -> ApiResult<Json<PipelineDetail>> {
    tracing::info!("Updating detail: {}", id);

    let detail = pipeline_service::update_detail(&pool, id, req).await?;

    Ok(Json(detail))
}

/// DELETE /details/{id}
pub async fn delete_detail(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    tracing::info!("Deleting detail: {}", id);

    pipeline_service::delete_detail(&pool, id).await?;

    Ok(StatusCode::NO_CONTENT)
}
