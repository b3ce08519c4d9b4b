//! Error types for the ledger client

use serde::Deserialize;
use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur when using the ledger client
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed before a response arrived
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// Server returned an error status code
    #[error("API error (status {status}): {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error kind reported by the server, e.g. `InvalidStateTransition`
        kind: Option<String>,
        /// Error message from the server
        message: String,
    },

    /// Failed to parse response
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Request rejected before it was sent
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
    kind: Option<String>,
}

impl ClientError {
    /// Build an API error from a status code and raw response body
    ///
    /// JSON bodies of the form `{"error": ..., "kind": ...}` are unpacked;
    /// anything else is kept verbatim as the message.
    pub fn api_error(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();

        match serde_json::from_str::<ErrorBody>(&body) {
            Ok(parsed) => Self::ApiError {
                status,
                kind: parsed.kind,
                message: parsed.error,
            },
            Err(_) => Self::ApiError {
                status,
                kind: None,
                message: body,
            },
        }
    }

    /// Server-reported error kind, if any
    pub fn kind(&self) -> Option<&str> {
        match self {
            Self::ApiError { kind, .. } => kind.as_deref(),
            _ => None,
        }
    }

    /// Check if this error is a "not found" error (unknown run, tag or code)
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ApiError { status: 404, .. })
    }

    /// Check if the server refused the request as conflicting with stored state
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::ApiError { status: 409, .. })
    }

    /// Check if a run was already terminal when completion was requested
    pub fn is_invalid_state_transition(&self) -> bool {
        self.kind() == Some("InvalidStateTransition")
    }

    /// Check if this error is a client error (4xx status)
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::ApiError { status, .. } if (400..500).contains(status))
    }

    /// Check if this error is a server error (5xx status)
    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::ApiError { status, .. } if *status >= 500)
    }

    /// Check if repeating the same request could succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RequestFailed(err) => err.is_connect() || err.is_timeout(),
            Self::ApiError { .. } => self.is_server_error(),
            _ => false,
        }
    }
}
