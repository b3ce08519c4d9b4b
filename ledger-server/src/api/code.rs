//! Reference Code API Handlers
//!
//! HTTP endpoints for code types and system codes.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use ledger_core::domain::code::{CodeType, SystemCode};
use ledger_core::dto::code::{CreateCodeType, CreateSystemCode, UpdateSystemCode};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::api::error::ApiResult;
use crate::service::code_service;

/// Query parameters for GET /codes
#[derive(Debug, Default, Deserialize)]
pub struct CodeListQuery {
    pub code_type: Option<String>,
    #[serde(default)]
    pub active_only: bool,
}

/// Response of GET /codes/resolve/{code_type}/{common_cd}
#[derive(Debug, Serialize)]
pub struct ResolvedCode {
    pub code_type_cd: String,
    pub common_cd: String,
    pub code_id: i64,
}

/// POST /code-types
pub async fn create_code_type(
    State(pool): State<PgPool>,
    Json(req): Json<CreateCodeType>,
) -> ApiResult<(StatusCode, Json<CodeType>)> {
    tracing::info!("Creating code type: {}", req.code_type_cd);

    let code_type = code_service::create_code_type(&pool, req).await?;

    Ok((StatusCode::CREATED, Json(code_type)))
}

/// GET /code-types
pub async fn list_code_types(State(pool): State<PgPool>) -> ApiResult<Json<Vec<CodeType>>> {
    tracing::debug!("Listing code types");

    let code_types = code_service::list_code_types(&pool).await?;

    Ok(Json(code_types))
}

/// POST /codes
pub async fn create_code(
    State(pool): State<PgPool>,
    Json(req): Json<CreateSystemCode>,
) -> ApiResult<(StatusCode, Json<SystemCode>)> {
    tracing::info!("Creating code: {}/{}", req.code_type_cd, req.common_cd);

    let code = code_service::create_code(&pool, req).await?;

    Ok((StatusCode::CREATED, Json(code)))
}

/// GET /codes?code_type=&active_only=
pub async fn list_codes(
    State(pool): State<PgPool>,
    Query(query): Query<CodeListQuery>,
) -> ApiResult<Json<Vec<SystemCode>>> {
    tracing::debug!("Listing codes: {:?}", query);

    let codes =
        code_service::list_codes(&pool, query.code_type.as_deref(), query.active_only).await?;

    Ok(Json(codes))
}

/// GET /codes/{id}
pub async fn get_code(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> ApiResult<Json<SystemCode>> {
    tracing::debug!("Getting code: {}", id);

    let code = code_service::get_code(&pool, id).await?;

    Ok(Json(code))
}

/// PUT /codes/{id}
pub async fn update_code(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateSystemCode>,
) -> ApiResult<Json<SystemCode>> {
    tracing::info!("Updating code: {}", id);

    let code = code_service::update_code(&pool, id, req).await?;

    Ok(Json(code))
}

/// POST /codes/{id}/deactivate
pub async fn deactivate_code(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    tracing::info!("Deactivating code: {}", id);

    code_service::deactivate_code(&pool, id).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /codes/{id}
pub async fn delete_code(State(pool): State<PgPool>, Path(id): Path<i64>) -> ApiResult<StatusCode> {
    tracing::info!("Deleting code: {}", id);

    code_service::delete_code(&pool, id).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// GET /codes/resolve/{code_type}/{common_cd}
pub async fn resolve_code(
    State(pool): State<PgPool>,
    Path((code_type, common_cd)): Path<(String, String)>,
) -> ApiResult<Json<ResolvedCode>> {
    tracing::debug!("Resolving code: {}/{}", code_type, common_cd);

    let code_id = code_service::resolve(&pool, &code_type, &common_cd).await?;

    Ok(Json(ResolvedCode {
        code_type_cd: code_type.trim().to_uppercase(),
        common_cd: common_cd.trim().to_uppercase(),
        code_id,
    }))
}
