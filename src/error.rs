// SPDX-License-Identifier: MIT

//! Application error types with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Missing registry configuration: {0}")]
    Configuration(&'static str),

    #[error("Registry token negotiation failed: {0}")]
    UpstreamAuth(String),

    #[error("Registry returned HTTP {status} for {url}: {body}")]
    UpstreamHttp { status: u16, url: String, body: String },

    #[error("Registry call timed out: {0}")]
    Timeout(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized", None),
            AppError::InvalidToken => (StatusCode::UNAUTHORIZED, "invalid_token", None),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", Some(msg.clone())),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "bad_request", Some(msg.clone()))
            }
            AppError::Configuration(var) => {
                tracing::error!(variable = *var, "Registry is not configured");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "registry_not_configured",
                    None,
                )
            }
            AppError::UpstreamAuth(msg) => {
                tracing::error!(error = %msg, "Registry token negotiation failed");
                (StatusCode::BAD_GATEWAY, "registry_auth_error", None)
            }
            AppError::UpstreamHttp { status, url, body } => {
                tracing::error!(status = *status, url = %url, body = %body, "Registry request failed");
                (
                    StatusCode::BAD_GATEWAY,
                    "registry_error",
                    Some(format!("registry returned HTTP {}", status)),
                )
            }
            AppError::Timeout(url) => {
                tracing::warn!(url = %url, "Registry call timed out");
                (StatusCode::GATEWAY_TIMEOUT, "registry_timeout", None)
            }
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "database_error", None)
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
