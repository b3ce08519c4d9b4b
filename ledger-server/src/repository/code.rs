//! Reference Code Repository
//!
//! Handles all database operations for code types and system codes.

use chrono::{DateTime, Utc};
use ledger_core::domain::code::{CodeType, SystemCode};
use ledger_core::dto::code::{CodeDependent, CreateSystemCode, UpdateSystemCode};
use sqlx::PgPool;

const CODE_COLUMNS: &str = r#"
    code_id, code_type_cd, common_cd, description, sort_order,
    is_active, created_at, updated_at
"#;

// =============================================================================
// Code Types
// =============================================================================

pub async fn create_code_type(pool: &PgPool, code_type: &CodeType) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO code_type (code_type_cd, description) VALUES ($1, $2)")
        .bind(&code_type.code_type_cd)
        .bind(&code_type.description)
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn list_code_types(pool: &PgPool) -> Result<Vec<CodeType>, sqlx::Error> {
    let rows = sqlx::query_as::<_, CodeTypeRow>(
        "SELECT code_type_cd, description FROM code_type ORDER BY code_type_cd",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(|r| r.into()).collect())
}

pub async fn code_type_exists(pool: &PgPool, code_type_cd: &str) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM code_type WHERE code_type_cd = $1)")
        .bind(code_type_cd)
        .fetch_one(pool)
        .await
}

// =============================================================================
// System Codes
// =============================================================================

/// Insert a system code; identifiers must already be normalized
pub async fn create(pool: &PgPool, req: &CreateSystemCode) -> Result<SystemCode, sqlx::Error> {
    let row = sqlx::query_as::<_, SystemCodeRow>(&format!(
        r#"
        INSERT INTO system_codes (code_type_cd, common_cd, description, sort_order, is_active)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING {CODE_COLUMNS}
        "#
    ))
    .bind(&req.code_type_cd)
    .bind(&req.common_cd)
    .bind(&req.description)
    .bind(req.sort_order)
    .bind(req.is_active)
    .fetch_one(pool)
    .await?;

    Ok(row.into())
}

pub async fn find_by_id(pool: &PgPool, code_id: i64) -> Result<Option<SystemCode>, sqlx::Error> {
    let row = sqlx::query_as::<_, SystemCodeRow>(&format!(
        "SELECT {CODE_COLUMNS} FROM system_codes WHERE code_id = $1"
    ))
    .bind(code_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|r| r.into()))
}

/// Active codes of one type, in display order
pub async fn list_active(pool: &PgPool, code_type_cd: &str) -> Result<Vec<SystemCode>, sqlx::Error> {
    let rows = sqlx::query_as::<_, SystemCodeRow>(&format!(
        r#"
        SELECT {CODE_COLUMNS}
        FROM system_codes
        WHERE code_type_cd = $1 AND is_active
        ORDER BY sort_order, common_cd
        "#
    ))
    .bind(code_type_cd)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(|r| r.into()).collect())
}

/// Every code, optionally restricted to one type, inactive included
pub async fn list_all(
    pool: &PgPool,
    code_type_cd: Option<&str>,
) -> Result<Vec<SystemCode>, sqlx::Error> {
    let rows = sqlx::query_as::<_, SystemCodeRow>(&format!(
        r#"
        SELECT {CODE_COLUMNS}
        FROM system_codes
        WHERE $1::VARCHAR IS NULL OR code_type_cd = $1
        ORDER BY code_type_cd, sort_order, common_cd
        "#
    ))
    .bind(code_type_cd)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(|r| r.into()).collect())
}

/// Look up the id of an active code
pub async fn resolve_active(
    pool: &PgPool,
    code_type_cd: &str,
    common_cd: &str,
) -> Result<Option<i64>, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        r#"
        SELECT code_id
        FROM system_codes
        WHERE code_type_cd = $1 AND common_cd = $2 AND is_active
        "#,
    )
    .bind(code_type_cd)
    .bind(common_cd)
    .fetch_optional(pool)
    .await
}

/// Look up the id of a code regardless of its active flag
///
/// Used for codes the server itself owns, such as run statuses.
pub async fn find_id(
    pool: &PgPool,
    code_type_cd: &str,
    common_cd: &str,
) -> Result<Option<i64>, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        r#"
        SELECT code_id
        FROM system_codes
        WHERE code_type_cd = $1 AND common_cd = $2
        "#,
    )
    .bind(code_type_cd)
    .bind(common_cd)
    .fetch_optional(pool)
    .await
}

pub async fn update(
    pool: &PgPool,
    code_id: i64,
    req: &UpdateSystemCode,
) -> Result<Option<SystemCode>, sqlx::Error> {
    let row = sqlx::query_as::<_, SystemCodeRow>(&format!(
        r#"
        UPDATE system_codes
        SET description = $1, sort_order = $2, is_active = $3, updated_at = NOW()
        WHERE code_id = $4
        RETURNING {CODE_COLUMNS}
        "#
    ))
    .bind(&req.description)
    .bind(req.sort_order)
    .bind(req.is_active)
    .bind(code_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|r| r.into()))
}

pub async fn deactivate(pool: &PgPool, code_id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE system_codes SET is_active = FALSE, updated_at = NOW() WHERE code_id = $1",
    )
    .bind(code_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Count rows referencing a code, one entry per referencing kind
///
/// Kinds with no references are omitted.
pub async fn count_dependents(
    pool: &PgPool,
    code_id: i64,
) -> Result<Vec<CodeDependent>, sqlx::Error> {
    let row = sqlx::query_as::<_, DependentCountsRow>(
        r#"
        SELECT
            (SELECT COUNT(*) FROM pipeline WHERE pipeline_type_id = $1) AS pipelines_by_type,
            (SELECT COUNT(*) FROM pipeline WHERE pipeline_status_id = $1) AS pipelines_by_status,
            (SELECT COUNT(*) FROM pipeline_environment WHERE env_code_id = $1) AS environments,
            (SELECT COUNT(*) FROM pipeline_details WHERE detail_type_id = $1) AS pipeline_details,
            (SELECT COUNT(*) FROM pipeline_run WHERE status_id = $1) AS runs,
            (SELECT COUNT(*) FROM pipeline_run_details WHERE detail_type_id = $1) AS run_details
        "#,
    )
    .bind(code_id)
    .fetch_one(pool)
    .await?;

    Ok(row.into_dependents())
}

pub async fn delete(pool: &PgPool, code_id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM system_codes WHERE code_id = $1")
        .bind(code_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

// =============================================================================
// Database Row Types
// =============================================================================

#[derive(sqlx::FromRow)]
struct CodeTypeRow {
    code_type_cd: String,
    description: String,
}

impl From<CodeTypeRow> for CodeType {
    fn from(row: CodeTypeRow) -> Self {
        CodeType {
            code_type_cd: row.code_type_cd,
            description: row.description,
        }
    }
}

#[derive(sqlx::FromRow)]
struct SystemCodeRow {
    code_id: i64,
    code_type_cd: String,
    common_cd: String,
    description: String,
    sort_order: i32,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<SystemCodeRow> for SystemCode {
    fn from(row: SystemCodeRow) -> Self {
        SystemCode {
            code_id: row.code_id,
            code_type_cd: row.code_type_cd,
            common_cd: row.common_cd,
            description: row.description,
            sort_order: row.sort_order,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct DependentCountsRow {
    pipelines_by_type: i64,
    pipelines_by_status: i64,
    environments: i64,
    pipeline_details: i64,
    runs: i64,
    run_details: i64,
}

impl DependentCountsRow {
    fn into_dependents(self) -> Vec<CodeDependent> {
        [
            ("pipelines_by_type", self.pipelines_by_type),
            ("pipelines_by_status", self.pipelines_by_status),
            ("pipeline_environments", self.environments),
            ("pipeline_details", self.pipeline_details),
            ("pipeline_runs", self.runs),
            ("pipeline_run_details", self.run_details),
        ]
        .into_iter()
        .filter(|(_, count)| *count > 0)
        .map(|(kind, count)| CodeDependent {
            kind: kind.to_string(),
            count,
        })
        .collect()
    }
}
