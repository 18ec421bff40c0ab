//! API error type and HTTP status mapping
//!
//! Ownership misses surface as 404 (never 403) so an unowned row's
//! existence is not confirmed to the caller. External-service failures are
//! logged and surfaced as 500 with best-effort detail.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found, or not owned by the caller (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// No active session (401)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// External service failure (500)
    #[error("External service error: {0}")]
    External(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<shelfmark_common::Error> for ApiError {
    fn from(err: shelfmark_common::Error) -> Self {
        use shelfmark_common::Error;
        match err {
            Error::NotFound(msg) => ApiError::NotFound(msg),
            Error::InvalidInput(msg) => ApiError::BadRequest(msg),
            Error::Unauthorized(msg) => ApiError::Unauthorized(msg),
            Error::External(msg) => ApiError::External(msg),
            Error::Database(e) => ApiError::Internal(format!("Database error: {}", e)),
            Error::Io(e) => ApiError::Internal(format!("IO error: {}", e)),
            Error::Config(msg) => ApiError::Internal(format!("Configuration error: {}", msg)),
            Error::Internal(msg) => ApiError::Internal(msg),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg),
            ApiError::External(msg) => {
                tracing::error!(error = %msg, "External service call failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "EXTERNAL_ERROR", msg)
            }
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg)
            }
        };

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
