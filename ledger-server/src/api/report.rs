//! Report API Handlers
//!
//! Dashboard projections. Every endpoint accepts `?days=` (default 30).

use axum::{
    Json,
    extract::{Query, State},
};
use ledger_core::dto::report::{
    DailyRunCount, EnvironmentRunCount, Overview, PipelinePerformance, ReportWindow,
    TypeSuccessRate,
};
use sqlx::PgPool;

use crate::api::error::ApiResult;
use crate::service::report_service;

/// GET /reports/overview
pub async fn overview(
    State(pool): State<PgPool>,
    Query(window): Query<ReportWindow>,
) -> ApiResult<Json<Overview>> {
    tracing::debug!("Overview report over {} days", window.days);
    Ok(Json(report_service::overview(&pool, window).await?))
}

/// GET /reports/by-type
pub async fn success_by_type(
    State(pool): State<PgPool>,
    Query(window): Query<ReportWindow>,
) -> ApiResult<Json<Vec<TypeSuccessRate>>> {
    Ok(Json(report_service::success_by_type(&pool, window).await?))
}

/// GET /reports/by-environment
pub async fn runs_by_environment(
    State(pool): State<PgPool>,
    Query(window): Query<ReportWindow>,
) -> ApiResult<Json<Vec<EnvironmentRunCount>>> {
    Ok(Json(report_service::runs_by_environment(&pool, window).await?))
}

/// GET /reports/daily
pub async fn daily_counts(
    State(pool): State<PgPool>,
    Query(window): Query<ReportWindow>,
) -> ApiResult<Json<Vec<DailyRunCount>>> {
    Ok(Json(report_service::daily_counts(&pool, window).await?))
}

/// GET /reports/pipelines
pub async fn pipeline_performance(
    State(pool): State<PgPool>,
    Query(window): Query<ReportWindow>,
) -> ApiResult<Json<Vec<PipelinePerformance>>> {
    Ok(Json(report_service::pipeline_performance(&pool, window).await?))
}
