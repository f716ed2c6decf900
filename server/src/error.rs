//! Error types for the TaskFlow server.
//!
//! This module defines the error hierarchy used throughout the server and
//! its mapping onto HTTP responses. Every error renders as the JSON envelope
//! `{"error": "...", "code": "..."}` with a status code appropriate to the
//! failure:
//!
//! - authentication failures map to 401 (or 503 when the auth provider is
//!   unreachable)
//! - request validation failures map to 400
//! - a missing task row maps to 404
//! - Supabase transport failures map to 503, other upstream errors to 502

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use crate::auth::AuthError;
use crate::config::ConfigError;
use crate::supabase::SupabaseError;

/// Top-level error type for the TaskFlow server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Configuration error during server initialization.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Authentication or authorization failure.
    #[error("authentication failed: {0}")]
    Auth(#[from] AuthError),

    /// Request validation failure.
    #[error("validation error: {0}")]
    Validation(String),

    /// Task store (Supabase) failure.
    #[error("task store error: {0}")]
    Supabase(#[from] SupabaseError),
}

/// JSON error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Human-readable error message.
    pub error: String,

    /// Stable machine-readable error code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl ErrorBody {
    /// Creates an error body with a message and code.
    #[must_use]
    pub fn new(error: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: Some(code.into()),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            Self::Auth(AuthError::MissingToken) => (
                StatusCode::UNAUTHORIZED,
                "missing_token",
                "Unauthorized".to_string(),
            ),
            Self::Auth(AuthError::InvalidToken) => (
                StatusCode::UNAUTHORIZED,
                "invalid_token",
                "Unauthorized".to_string(),
            ),
            Self::Auth(AuthError::Unavailable(_)) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "auth_unavailable",
                "authentication service unavailable".to_string(),
            ),
            Self::Validation(message) => (
                StatusCode::BAD_REQUEST,
                "invalid_request",
                message.clone(),
            ),
            Self::Supabase(SupabaseError::Unauthorized) => (
                StatusCode::UNAUTHORIZED,
                "invalid_token",
                "Unauthorized".to_string(),
            ),
            Self::Supabase(SupabaseError::RowNotFound) => (
                StatusCode::NOT_FOUND,
                "not_found",
                "task not found".to_string(),
            ),
            Self::Supabase(SupabaseError::Timeout(_) | SupabaseError::Unavailable(_)) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "store_unavailable",
                "task store unavailable".to_string(),
            ),
            Self::Supabase(_) => (
                StatusCode::BAD_GATEWAY,
                "store_error",
                "task store error".to_string(),
            ),
            Self::Config(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "server_error",
                "server configuration error".to_string(),
            ),
        };

        (status, Json(ErrorBody::new(message, code))).into_response()
    }
}
