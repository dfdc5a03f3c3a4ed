//! Error types for the gateway server.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// Server error type.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The timetable backend misbehaved.
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<mkr_api::Error> for ServerError {
    fn from(e: mkr_api::Error) -> Self {
        if e.is_no_schedule_data() {
            // An empty window reads as an absent resource, not a failure.
            ServerError::NotFound(e.to_string())
        } else if e.is_transport() {
            ServerError::Upstream(e.to_string())
        } else {
            ServerError::Internal(e.to_string())
        }
    }
}

/// Result type for server operations.
pub type Result<T> = std::result::Result<T, ServerError>;

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ServerError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            ServerError::Upstream(_) => (StatusCode::BAD_GATEWAY, "bad_gateway"),
            ServerError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        };

        let message = self.to_string();

        match &self {
            ServerError::NotFound(_) => {
                tracing::warn!(status = %status, code, error = %message, "Client error");
            }
            _ => {
                tracing::error!(status = %status, code, error = %message, "Server error");
            }
        }

        let body = ErrorResponse {
            code: code.to_string(),
            message,
        };

        (status, Json(body)).into_response()
    }
}
