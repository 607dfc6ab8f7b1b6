//! Error types for zbridge
//!
//! HTTP-facing errors. Adapter failures are mapped onto status codes here so
//! that clients see which phase failed and why.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::adapter::AdapterError;

/// Application-level errors
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Invalid API key")]
    InvalidToken,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Upstream error: {0}")]
    Adapter(#[from] AdapterError),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

/// Error details
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<ErrorDetails>,
}

/// Upstream context for adapter failures
#[derive(Debug, Serialize)]
pub struct ErrorDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upstream_status: Option<u16>,
}

impl AppError {
    /// HTTP status and machine-readable code for this error
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            AppError::InvalidToken => (StatusCode::UNAUTHORIZED, "INVALID_TOKEN"),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            AppError::Adapter(err) => match err {
                AdapterError::Protocol(_) => (StatusCode::BAD_REQUEST, "PROTOCOL_ERROR"),
                AdapterError::UpstreamStatus { .. } => {
                    (StatusCode::BAD_GATEWAY, "UPSTREAM_STATUS_ERROR")
                }
                AdapterError::Transport { .. } => (StatusCode::BAD_GATEWAY, "TRANSPORT_ERROR"),
                AdapterError::ResponseParse { .. } => {
                    (StatusCode::BAD_GATEWAY, "RESPONSE_PARSE_ERROR")
                }
                AdapterError::Serialization { .. } => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "SERIALIZATION_ERROR")
                }
                AdapterError::Configuration(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "CONFIGURATION_ERROR")
                }
            },
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let (message, details) = match &self {
            AppError::Adapter(err) => {
                let details = err.phase().map(|phase| ErrorDetails {
                    phase: Some(phase.to_string()),
                    upstream_status: err.upstream_status(),
                });
                (err.to_string(), details)
            }
            AppError::Internal(_) => ("Internal server error".to_string(), None),
            other => (other.to_string(), None),
        };

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message,
                details,
            },
        };

        (status, Json(body)).into_response()
    }
}
