//! API Error Handling
//!
//! Unified error type and conversion from service errors to HTTP responses.
//! Every error body is `{"error": <message>, "kind": <error kind>}`, with
//! extra fields for errors that carry structured context.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};

use crate::db;
use crate::service::{code_service, pipeline_service, report_service, run_service};

/// API error type
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound {
        kind: &'static str,
        message: String,
    },
    Conflict {
        kind: &'static str,
        message: String,
        context: Option<Value>,
    },
    DatabaseError(sqlx::Error),
    InternalError(String),
}

impl ApiError {
    fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound {
            kind: "NotFound",
            message: message.into(),
        }
    }

    fn conflict(kind: &'static str, message: impl Into<String>) -> Self {
        ApiError::Conflict {
            kind,
            message: message.into(),
            context: None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind, message, context) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "ValidationError", msg, None),
            ApiError::NotFound { kind, message } => (StatusCode::NOT_FOUND, kind, message, None),
            ApiError::Conflict {
                kind,
                message,
                context,
            } => (StatusCode::CONFLICT, kind, message, context),
            ApiError::DatabaseError(err) if db::is_store_unavailable(&err) => {
                tracing::error!("Database unavailable: {:?}", err);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "StoreUnavailable",
                    "Database unavailable".to_string(),
                    None,
                )
            }
            ApiError::DatabaseError(err) => {
                tracing::error!("Database error: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "InternalError",
                    "Internal server error".to_string(),
                    None,
                )
            }
            ApiError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "InternalError", msg, None)
            }
        };

        let mut body = json!({ "error": message, "kind": kind });
        if let (Some(Value::Object(extra)), Some(fields)) = (context, body.as_object_mut()) {
            fields.extend(extra);
        }

        (status, Json(body)).into_response()
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        ApiError::DatabaseError(err)
    }
}

impl From<code_service::CodeError> for ApiError {
    fn from(err: code_service::CodeError) -> Self {
        use code_service::CodeError;

        match err {
            CodeError::NotFound(id) => ApiError::not_found(format!("Code {} not found", id)),
            CodeError::UnknownCode {
                code_type,
                common_cd,
            } => ApiError::NotFound {
                kind: "UnknownCode",
                message: format!("Unknown code {}/{}", code_type, common_cd),
            },
            CodeError::UnknownCodeType(code_type) => ApiError::NotFound {
                kind: "UnknownCodeType",
                message: format!("Unknown code type {}", code_type),
            },
            CodeError::DuplicateCode(msg) => ApiError::conflict("DuplicateCode", msg),
            CodeError::ReferencedByDependents {
                code_id,
                dependents,
            } => ApiError::Conflict {
                kind: "ReferencedByDependents",
                message: format!("Code {} is still referenced", code_id),
                context: Some(json!({ "dependents": dependents })),
            },
            CodeError::ValidationError(msg) => ApiError::BadRequest(msg),
            CodeError::DatabaseError(err) => ApiError::DatabaseError(err),
        }
    }
}

impl From<pipeline_service::PipelineError> for ApiError {
    fn from(err: pipeline_service::PipelineError) -> Self {
        use pipeline_service::PipelineError;

        match err {
            PipelineError::NotFound(msg) => ApiError::not_found(msg),
            PipelineError::UnknownCode(code) => ApiError::NotFound {
                kind: "UnknownCode",
                message: format!("Unknown code {}", code),
            },
            PipelineError::DuplicateEnvironment {
                pipeline_id,
                env_code,
            } => ApiError::conflict(
                "DuplicateEnvironment",
                format!(
                    "Pipeline {} is already bound to environment {}",
                    pipeline_id, env_code
                ),
            ),
            PipelineError::ValidationError(msg) => ApiError::BadRequest(msg),
            PipelineError::DatabaseError(err) => ApiError::DatabaseError(err),
        }
    }
}

impl From<run_service::RunError> for ApiError {
    fn from(err: run_service::RunError) -> Self {
        use run_service::RunError;

        match err {
            RunError::NotFound(id) => ApiError::not_found(format!("Run {} not found", id)),
            RunError::UnknownCode(code) => ApiError::NotFound {
                kind: "UnknownCode",
                message: format!("Unknown code {}", code),
            },
            RunError::UnknownPipelineTag(tag) => ApiError::NotFound {
                kind: "UnknownPipelineTag",
                message: format!("No active pipeline with tag '{}'", tag),
            },
            RunError::AmbiguousPipelineTag(tag) => ApiError::conflict(
                "AmbiguousPipelineTag",
                format!("More than one active pipeline has tag '{}'", tag),
            ),
            RunError::EnvironmentNotBound {
                pipeline_tag,
                environment,
            } => ApiError::conflict(
                "EnvironmentNotBound",
                format!(
                    "Pipeline '{}' is not bound to environment {}",
                    pipeline_tag, environment
                ),
            ),
            RunError::InvalidStateTransition { run_id, from, to } => ApiError::Conflict {
                kind: "InvalidStateTransition",
                message: format!("Run {} cannot move from {} to {}", run_id, from, to),
                context: Some(json!({ "current_status": from })),
            },
            RunError::ValidationError(msg) => ApiError::BadRequest(msg),
            RunError::DatabaseError(err) => ApiError::DatabaseError(err),
        }
    }
}

impl From<report_service::ReportError> for ApiError {
    fn from(err: report_service::ReportError) -> Self {
        use report_service::ReportError;

        match err {
            ReportError::ValidationError(msg) => ApiError::BadRequest(msg),
            ReportError::DatabaseError(err) => ApiError::DatabaseError(err),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use ledger_core::domain::run::RunStatus;
    use ledger_core::dto::code::CodeDependent;

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_validation_error_is_bad_request() {
        let response = ApiError::BadRequest("Pipeline name cannot be empty".to_string())
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(body["kind"], "ValidationError");
        assert_eq!(body["error"], "Pipeline name cannot be empty");
    }

    #[tokio::test]
    async fn test_invalid_transition_is_conflict_with_status() {
        let err: ApiError = run_service::RunError::InvalidStateTransition {
            run_id: 9,
            from: RunStatus::Completed,
            to: RunStatus::Failed,
        }
        .into();

        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let body = body_json(response).await;
        assert_eq!(body["kind"], "InvalidStateTransition");
        assert_eq!(body["current_status"], "COMPLETED");
    }

    #[tokio::test]
    async fn test_referenced_code_lists_dependents() {
        let err: ApiError = code_service::CodeError::ReferencedByDependents {
            code_id: 3,
            dependents: vec![CodeDependent {
                kind: "pipeline_runs".to_string(),
                count: 4,
            }],
        }
        .into();

        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let body = body_json(response).await;
        assert_eq!(body["dependents"][0]["kind"], "pipeline_runs");
        assert_eq!(body["dependents"][0]["count"], 4);
    }

    #[tokio::test]
    async fn test_unknown_tag_is_not_found() {
        let err: ApiError = run_service::RunError::UnknownPipelineTag("orders".to_string()).into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["kind"], "UnknownPipelineTag");
    }

    #[tokio::test]
    async fn test_pool_timeout_is_service_unavailable() {
        let response = ApiError::DatabaseError(sqlx::Error::PoolTimedOut).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body_json(response).await["kind"], "StoreUnavailable");
    }

    #[tokio::test]
    async fn test_other_database_errors_are_internal() {
        let response = ApiError::DatabaseError(sqlx::Error::RowNotFound).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["kind"], "InternalError");
        assert_eq!(body["error"], "Internal server error");
    }
}
