//! Database pool, schema migrations and seed codes

use sqlx::{
    PgPool,
    postgres::{PgConnectOptions, PgPoolOptions},
};

use crate::config::ServerConfig;

pub async fn create_pool(
    config: &ServerConfig,
    options: PgConnectOptions,
) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout)
        .connect_with(options)
        .await
}

/// Whether an error means the store could not be reached at all, as opposed
/// to a statement failing on a reachable store
pub fn is_store_unavailable(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed
    )
}

pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

pub fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_foreign_key_violation())
}

// Foreign keys carry no ON DELETE CASCADE: pipeline deletion removes
// dependents explicitly, in order, inside one transaction.
const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS code_type (
        code_type_cd VARCHAR(50) PRIMARY KEY,
        description VARCHAR(255) NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS system_codes (
        code_id BIGSERIAL PRIMARY KEY,
        code_type_cd VARCHAR(50) NOT NULL REFERENCES code_type(code_type_cd),
        common_cd VARCHAR(50) NOT NULL,
        description VARCHAR(255) NOT NULL,
        sort_order INTEGER NOT NULL DEFAULT 0,
        is_active BOOLEAN NOT NULL DEFAULT TRUE,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        CONSTRAINT uq_system_codes_type_code UNIQUE (code_type_cd, common_cd)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS pipeline (
        pipeline_id BIGSERIAL PRIMARY KEY,
        pipeline_name VARCHAR(255) NOT NULL,
        pipeline_type_id BIGINT NOT NULL REFERENCES system_codes(code_id),
        pipeline_status_id BIGINT NOT NULL REFERENCES system_codes(code_id),
        description TEXT,
        tag VARCHAR(255),
        is_active BOOLEAN NOT NULL DEFAULT TRUE,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS pipeline_environment (
        environment_id BIGSERIAL PRIMARY KEY,
        pipeline_id BIGINT NOT NULL REFERENCES pipeline(pipeline_id),
        env_code_id BIGINT NOT NULL REFERENCES system_codes(code_id),
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        CONSTRAINT uq_pipeline_environment UNIQUE (pipeline_id, env_code_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS pipeline_details (
        detail_id BIGSERIAL PRIMARY KEY,
        pipeline_id BIGINT NOT NULL REFERENCES pipeline(pipeline_id),
        environment_id BIGINT NOT NULL REFERENCES pipeline_environment(environment_id),
        detail_type_id BIGINT NOT NULL REFERENCES system_codes(code_id),
        detail_desc TEXT NOT NULL,
        detail_data TEXT,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS pipeline_run (
        pipeline_run_id BIGSERIAL PRIMARY KEY,
        pipeline_id BIGINT NOT NULL REFERENCES pipeline(pipeline_id),
        environment_id BIGINT NOT NULL REFERENCES pipeline_environment(environment_id),
        status_id BIGINT NOT NULL REFERENCES system_codes(code_id),
        start_dt TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        end_dt TIMESTAMPTZ,
        description TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS pipeline_run_details (
        detail_id BIGSERIAL PRIMARY KEY,
        pipeline_run_id BIGINT NOT NULL REFERENCES pipeline_run(pipeline_run_id),
        detail_type_id BIGINT NOT NULL REFERENCES system_codes(code_id),
        detail_desc TEXT,
        detail_data TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT clock_timestamp()
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_pipeline_tag ON pipeline(tag) WHERE is_active",
    "CREATE INDEX IF NOT EXISTS idx_pipeline_run_pipeline_id ON pipeline_run(pipeline_id)",
    "CREATE INDEX IF NOT EXISTS idx_pipeline_run_start_dt ON pipeline_run(start_dt DESC)",
    r#"
    CREATE INDEX IF NOT EXISTS idx_pipeline_run_details_latest
        ON pipeline_run_details(pipeline_run_id, detail_type_id, created_at DESC, detail_id DESC)
    "#,
];

/// Code types every deployment needs
pub const SEED_CODE_TYPES: &[(&str, &str)] = &[
    ("STATUS", "Pipeline run status"),
    ("PIPELINE_TYPE", "Kind of pipeline"),
    ("PIPELINE_STATUS", "Lifecycle status of a pipeline definition"),
    ("PIPELINE_ENVIRONMENT", "Deployment environment"),
    ("PIPELINE_RUN_DETAIL_TYPE", "Kind of detail attached to a pipeline or run"),
];

/// (code_type_cd, common_cd, description, sort_order)
pub const SEED_CODES: &[(&str, &str, &str, i32)] = &[
    ("STATUS", "RUNNING", "Running", 1),
    ("STATUS", "COMPLETED", "Completed", 2),
    ("STATUS", "FAILED", "Failed", 3),
    ("PIPELINE_TYPE", "BATCH", "Batch pipeline", 1),
    ("PIPELINE_TYPE", "STREAMING", "Streaming pipeline", 2),
    ("PIPELINE_STATUS", "ACTIVE", "Active", 1),
    ("PIPELINE_STATUS", "INACTIVE", "Inactive", 2),
    ("PIPELINE_ENVIRONMENT", "DEV", "Development", 1),
    ("PIPELINE_ENVIRONMENT", "TEST", "Test", 2),
    ("PIPELINE_ENVIRONMENT", "PROD", "Production", 3),
    ("PIPELINE_RUN_DETAIL_TYPE", "START", "Run start marker", 1),
    ("PIPELINE_RUN_DETAIL_TYPE", "CLOUDWATCH_LOG_LINK", "CloudWatch log link", 2),
    ("PIPELINE_RUN_DETAIL_TYPE", "TOTAL_PROCESSED_COUNT", "Total processed record count", 3),
    ("PIPELINE_RUN_DETAIL_TYPE", "ERROR_MESSAGE", "Error message", 4),
];

pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }

    for (code_type_cd, description) in SEED_CODE_TYPES {
        sqlx::query(
            r#"
            INSERT INTO code_type (code_type_cd, description)
            VALUES ($1, $2)
            ON CONFLICT (code_type_cd) DO NOTHING
            "#,
        )
        .bind(code_type_cd)
        .bind(description)
        .execute(pool)
        .await?;
    }

    for (code_type_cd, common_cd, description, sort_order) in SEED_CODES {
        sqlx::query(
            r#"
            INSERT INTO system_codes (code_type_cd, common_cd, description, sort_order)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (code_type_cd, common_cd) DO NOTHING
            "#,
        )
        .bind(code_type_cd)
        .bind(common_cd)
        .bind(description)
        .bind(sort_order)
        .execute(pool)
        .await?;
    }

    tracing::info!("Database migrations completed successfully");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledger_core::domain::run::RunStatus;

    #[test]
    fn test_every_run_status_is_seeded() {
        for status in RunStatus::ALL {
            assert!(
                SEED_CODES
                    .iter()
                    .any(|(t, c, _, _)| *t == "STATUS" && *c == status.as_code()),
                "missing seed for {}",
                status
            );
        }
    }

    #[test]
    fn test_seed_codes_reference_seeded_types() {
        for (code_type, common_cd, _, _) in SEED_CODES {
            assert!(
                SEED_CODE_TYPES.iter().any(|(t, _)| t == code_type),
                "{} uses unknown type {}",
                common_cd,
                code_type
            );
            assert_eq!(*common_cd, common_cd.to_uppercase());
        }
    }

    #[test]
    fn test_pool_timeouts_count_as_unavailable() {
        assert!(is_store_unavailable(&sqlx::Error::PoolTimedOut));
        assert!(is_store_unavailable(&sqlx::Error::PoolClosed));
        assert!(!is_store_unavailable(&sqlx::Error::RowNotFound));
    }
}
