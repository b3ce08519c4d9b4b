//! Reference Code Service
//!
//! Business logic for the code registry: code types, system codes, and
//! resolution of `(code_type, common_cd)` pairs to surrogate ids.

use ledger_core::domain::code::{CodeType, SystemCode, normalize_code};
use ledger_core::dto::code::{CodeDependent, CreateCodeType, CreateSystemCode, UpdateSystemCode};
use sqlx::PgPool;

use crate::db;
use crate::repository::code_repository;

const MAX_CODE_LEN: usize = 50;
const MAX_DESCRIPTION_LEN: usize = 255;

/// Service error type
#[derive(Debug)]
pub enum CodeError {
    NotFound(i64),
    UnknownCode { code_type: String, common_cd: String },
    UnknownCodeType(String),
    DuplicateCode(String),
    ReferencedByDependents { code_id: i64, dependents: Vec<CodeDependent> },
    ValidationError(String),
    DatabaseError(sqlx::Error),
}

impl From<sqlx::Error> for CodeError {
    fn from(err: sqlx::Error) -> Self {
        CodeError::DatabaseError(err)
    }
}

pub type Result<T> = std::result::Result<T, CodeError>;

// =============================================================================
// Code Types
// =============================================================================

pub async fn create_code_type(pool: &PgPool, req: CreateCodeType) -> Result<CodeType> {
    let code_type = CodeType {
        code_type_cd: normalize_code(&req.code_type_cd),
        description: req.description.trim().to_string(),
    };
    validate_code_type(&code_type)?;

    code_repository::create_code_type(pool, &code_type)
        .await
        .map_err(|e| {
            if db::is_unique_violation(&e) {
                CodeError::DuplicateCode(format!(
                    "Code type {} already exists",
                    code_type.code_type_cd
                ))
            } else {
                CodeError::DatabaseError(e)
            }
        })?;

    tracing::info!("Code type created: {}", code_type.code_type_cd);

    Ok(code_type)
}

pub async fn list_code_types(pool: &PgPool) -> Result<Vec<CodeType>> {
    Ok(code_repository::list_code_types(pool).await?)
}

// =============================================================================
// System Codes
// =============================================================================

/// Create a new system code under an existing code type
pub async fn create_code(pool: &PgPool, req: CreateSystemCode) -> Result<SystemCode> {
    let req = CreateSystemCode {
        code_type_cd: normalize_code(&req.code_type_cd),
        common_cd: normalize_code(&req.common_cd),
        description: req.description.trim().to_string(),
        ..req
    };
    validate_code_request(&req)?;

    if !code_repository::code_type_exists(pool, &req.code_type_cd).await? {
        return Err(CodeError::UnknownCodeType(req.code_type_cd));
    }

    let code = code_repository::create(pool, &req).await.map_err(|e| {
        if db::is_unique_violation(&e) {
            CodeError::DuplicateCode(format!(
                "Code {}/{} already exists",
                req.code_type_cd, req.common_cd
            ))
        } else if db::is_foreign_key_violation(&e) {
            CodeError::UnknownCodeType(req.code_type_cd.clone())
        } else {
            CodeError::DatabaseError(e)
        }
    })?;

    tracing::info!(
        "System code created: {}/{} ({})",
        code.code_type_cd,
        code.common_cd,
        code.code_id
    );

    Ok(code)
}

/// Get a system code by ID
pub async fn get_code(pool: &PgPool, code_id: i64) -> Result<SystemCode> {
    code_repository::find_by_id(pool, code_id)
        .await?
        .ok_or(CodeError::NotFound(code_id))
}

/// List codes
///
/// With `active_only` the result is the selection list for a type; otherwise
/// it is the admin view including inactive codes.
pub async fn list_codes(
    pool: &PgPool,
    code_type: Option<&str>,
    active_only: bool,
) -> Result<Vec<SystemCode>> {
    let code_type = code_type.map(normalize_code).filter(|t| !t.is_empty());

    match (code_type, active_only) {
        (Some(code_type), true) => Ok(code_repository::list_active(pool, &code_type).await?),
        (code_type, false) => Ok(code_repository::list_all(pool, code_type.as_deref()).await?),
        (None, true) => {
            let codes = code_repository::list_all(pool, None).await?;
            Ok(codes.into_iter().filter(|c| c.is_active).collect())
        }
    }
}

/// Resolve an active code to its surrogate id
///
/// Input is case-insensitive. Inactive codes do not resolve.
pub async fn resolve(pool: &PgPool, code_type: &str, common_cd: &str) -> Result<i64> {
    let code_type = normalize_code(code_type);
    let common_cd = normalize_code(common_cd);

    code_repository::resolve_active(pool, &code_type, &common_cd)
        .await?
        .ok_or(CodeError::UnknownCode {
            code_type,
            common_cd,
        })
}

pub async fn update_code(pool: &PgPool, code_id: i64, req: UpdateSystemCode) -> Result<SystemCode> {
    let req = UpdateSystemCode {
        description: req.description.trim().to_string(),
        ..req
    };
    validate_description(&req.description)?;

    let code = code_repository::update(pool, code_id, &req)
        .await?
        .ok_or(CodeError::NotFound(code_id))?;

    tracing::info!("System code updated: {}", code_id);

    Ok(code)
}

/// Soft delete: the code stays for history but no longer resolves
pub async fn deactivate_code(pool: &PgPool, code_id: i64) -> Result<()> {
    if !code_repository::deactivate(pool, code_id).await? {
        return Err(CodeError::NotFound(code_id));
    }

    tracing::info!("System code deactivated: {}", code_id);

    Ok(())
}

/// Hard delete, refused while any row references the code
pub async fn delete_code(pool: &PgPool, code_id: i64) -> Result<()> {
    if code_repository::find_by_id(pool, code_id).await?.is_none() {
        return Err(CodeError::NotFound(code_id));
    }

    let dependents = code_repository::count_dependents(pool, code_id).await?;
    if !dependents.is_empty() {
        return Err(CodeError::ReferencedByDependents {
            code_id,
            dependents,
        });
    }

    match code_repository::delete(pool, code_id).await {
        Ok(true) => {}
        Ok(false) => return Err(CodeError::NotFound(code_id)),
        // A reference was added after the count
        Err(e) if db::is_foreign_key_violation(&e) => {
            let dependents = code_repository::count_dependents(pool, code_id).await?;
            return Err(CodeError::ReferencedByDependents {
                code_id,
                dependents,
            });
        }
        Err(e) => return Err(e.into()),
    }

    tracing::info!("System code deleted: {}", code_id);

    Ok(())
}

// =============================================================================
// Validation
// =============================================================================

fn validate_code_type(code_type: &CodeType) -> Result<()> {
    validate_mnemonic("Code type", &code_type.code_type_cd)?;
    validate_description(&code_type.description)
}

fn validate_code_request(req: &CreateSystemCode) -> Result<()> {
    validate_mnemonic("Code type", &req.code_type_cd)?;
    validate_mnemonic("Code", &req.common_cd)?;
    validate_description(&req.description)
}

fn validate_mnemonic(label: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(CodeError::ValidationError(format!(
            "{} cannot be empty",
            label
        )));
    }

    if value.len() > MAX_CODE_LEN {
        return Err(CodeError::ValidationError(format!(
            "{} is too long (max {} characters)",
            label, MAX_CODE_LEN
        )));
    }

    Ok(())
}

fn validate_description(description: &str) -> Result<()> {
    if description.is_empty() {
        return Err(CodeError::ValidationError(
            "Description cannot be empty".to_string(),
        ));
    }

    if description.len() > MAX_DESCRIPTION_LEN {
        return Err(CodeError::ValidationError(format!(
            "Description is too long (max {} characters)",
            MAX_DESCRIPTION_LEN
        )));
    }

    Ok(())
}
