//! Axum-specific error types and mappings.
//!
//! Maps the core error taxonomy to HTTP status codes and JSON bodies.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

use gantry_core::ports::ProcessError;

/// Admin API error type.
#[derive(Debug, Error)]
pub enum HttpError {
    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request (invalid input).
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Service unavailable (the supervised application is not usable).
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
    status: u16,
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            HttpError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            HttpError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            HttpError::ServiceUnavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg.clone()),
            HttpError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        let body = ErrorBody {
            error: message,
            status: status.as_u16(),
        };

        (status, axum::Json(body)).into_response()
    }
}

impl From<ProcessError> for HttpError {
    fn from(err: ProcessError) -> Self {
        match err {
            ProcessError::NotRunning(msg) => HttpError::NotFound(msg),
            ProcessError::StartFailed(msg) => HttpError::ServiceUnavailable(msg),
            ProcessError::StopFailed(msg) => HttpError::Internal(format!("Stop failed: {}", msg)),
            ProcessError::Configuration(msg) => HttpError::BadRequest(msg),
            ProcessError::Internal(msg) => HttpError::Internal(msg),
        }
    }
}
