//! API Module
//!
//! HTTP API layer for the ledger server.
//! Each submodule handles endpoints for a specific domain.

pub mod code;
pub mod error;
pub mod health;
pub mod pipeline;
pub mod report;
pub mod run;

use axum::{
    Router,
    routing::{delete, get, post, put},
};
use sqlx::PgPool;
use tower_http::trace::TraceLayer;

/// Create the main API router with all endpoints
pub fn create_router(pool: PgPool) -> Router {
    Router::new()
        // Health checks
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check))
        // Reference code endpoints
        .route(
            "/code-types",
            get(code::list_code_types).post(code::create_code_type),
        )
        .route("/codes", get(code::list_codes).post(code::create_code))
        .route(
            "/codes/{id}",
            get(code::get_code)
                .put(code::update_code)
                .delete(code::delete_code),
        )
        .route("/codes/{id}/deactivate", post(code::deactivate_code))
        .route(
            "/codes/resolve/{code_type}/{common_cd}",
            get(code::resolve_code),
        )
        // Pipeline catalog endpoints
        .route(
            "/pipelines",
            get(pipeline::list_pipelines).post(pipeline::create_pipeline),
        )
        .route(
            "/pipelines/{id}",
            get(pipeline::get_pipeline)
                .put(pipeline::update_pipeline)
                .delete(pipeline::delete_pipeline),
        )
        .route(
            "/pipelines/{id}/environments",
            get(pipeline::list_environments).post(pipeline::add_environment),
        )
        .route("/environments/{id}", delete(pipeline::remove_environment))
        .route(
            "/pipelines/{id}/details",
            get(pipeline::list_details).post(pipeline::add_detail),
        )
        .route(
            "/details/{id}",
            put(pipeline::update_detail).delete(pipeline::delete_detail),
        )
        // Run ledger endpoints
        .route("/runs", get(run::list_runs))
        .route("/runs/start", post(run::start_run))
        .route("/runs/{id}", get(run::get_run))
        .route("/runs/{id}/complete", post(run::complete_run))
        .route(
            "/runs/{id}/details",
            get(run::list_run_details).post(run::add_run_detail),
        )
        // Reporting endpoints
        .route("/reports/overview", get(report::overview))
        .route("/reports/by-type", get(report::success_by_type))
        .route("/reports/by-environment", get(report::runs_by_environment))
        .route("/reports/daily", get(report::daily_counts))
        .route("/reports/pipelines", get(report::pipeline_performance))
        // Add state and middleware
        .with_state(pool)
        .layer(TraceLayer::new_for_http())
}
