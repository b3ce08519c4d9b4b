//! Shared fixtures for database-backed tests
//!
//! Tests that need PostgreSQL call [`test_pool`] and return early when it
//! yields `None`, so the suite passes on machines without a database.

#![allow(dead_code)]

use ledger_core::domain::pipeline::{Pipeline, PipelineEnvironment};
use ledger_core::dto::pipeline::{CreateEnvironment, CreatePipeline};
use ledger_server::db;
use ledger_server::service::pipeline_service;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

/// Code type prefix for codes created by tests; wiped on reset
pub const TEST_CODE_TYPE_PREFIX: &str = "TEST_";

/// Connect to `TEST_DATABASE_URL`, migrate, and clear ledger tables
pub async fn test_pool() -> Option<PgPool> {
    let Ok(url) = std::env::var("TEST_DATABASE_URL") else {
        eprintln!("TEST_DATABASE_URL not set, skipping database test");
        return None;
    };

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&url)
        .await
        .expect("Failed to connect to TEST_DATABASE_URL");

    db::run_migrations(&pool)
        .await
        .expect("Failed to run migrations");

    reset(&pool).await;

    Some(pool)
}

pub async fn reset(pool: &PgPool) {
    sqlx::query(
        r#"
        TRUNCATE pipeline_run_details, pipeline_run, pipeline_details,
                 pipeline_environment, pipeline
        RESTART IDENTITY
        "#,
    )
    .execute(pool)
    .await
    .expect("Failed to truncate ledger tables");

    sqlx::query("DELETE FROM system_codes WHERE code_type_cd LIKE $1")
        .bind(format!("{}%", TEST_CODE_TYPE_PREFIX))
        .execute(pool)
        .await
        .expect("Failed to delete test codes");

    sqlx::query("DELETE FROM code_type WHERE code_type_cd LIKE $1")
        .bind(format!("{}%", TEST_CODE_TYPE_PREFIX))
        .execute(pool)
        .await
        .expect("Failed to delete test code types");

    sqlx::query("UPDATE system_codes SET is_active = TRUE")
        .execute(pool)
        .await
        .expect("Failed to reactivate seed codes");
}

pub fn pipeline_request(name: &str, pipeline_type: &str, tag: Option<&str>) -> CreatePipeline {
    CreatePipeline {
        pipeline_name: name.to_string(),
        pipeline_type: pipeline_type.to_string(),
        pipeline_status: "ACTIVE".to_string(),
        description: None,
        tag: tag.map(str::to_string),
        is_active: true,
    }
}

/// Create an active BATCH pipeline bound to each of `environments`
pub async fn seed_pipeline(
    pool: &PgPool,
    name: &str,
    tag: &str,
    environments: &[&str],
) -> (Pipeline, Vec<PipelineEnvironment>) {
    let pipeline =
        pipeline_service::create_pipeline(pool, pipeline_request(name, "BATCH", Some(tag)))
            .await
            .expect("Failed to create pipeline");

    let mut bound = Vec::new();
    for env_code in environments {
        let environment = pipeline_service::add_environment(
            pool,
            pipeline.pipeline_id,
            CreateEnvironment {
                env_code: env_code.to_string(),
            },
        )
        .await
        .expect("Failed to bind environment");
        bound.push(environment);
    }

    (pipeline, bound)
}
