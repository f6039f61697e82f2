//! Unified error handling for the auth API.
//!
//! Every failure a handler can produce is an [`AuthError`]. Its `IntoResponse`
//! implementation deliberately collapses causes: a caller can tell a malformed
//! request from an authentication failure, but never which credential or
//! session check failed.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// API error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Unified error type for auth handlers
#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown user or wrong password
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Request body could not be parsed or is missing required fields
    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    /// Bad signature, malformed payload, expired or revoked session token
    #[error("Invalid session")]
    InvalidSession,

    /// Externally authenticated email is not on the whitelist
    #[error("Email not authorized")]
    EmailNotAuthorized,

    /// Anything that is the server's fault
    #[error("{0}")]
    Internal(#[from] anyhow::Error),
}

impl AuthError {
    pub fn malformed(message: impl Into<String>) -> Self {
        AuthError::MalformedRequest(message.into())
    }
}

impl From<serde_json::Error> for AuthError {
    fn from(err: serde_json::Error) -> Self {
        AuthError::MalformedRequest(err.to_string())
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            AuthError::InvalidCredentials
            | AuthError::InvalidSession
            | AuthError::EmailNotAuthorized => (StatusCode::UNAUTHORIZED, "Unauthorized"),
            AuthError::MalformedRequest(msg) => {
                tracing::debug!("Malformed request: {}", msg);
                (StatusCode::BAD_REQUEST, "Bad request")
            }
            AuthError::Internal(e) => {
                tracing::error!("Internal error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        let body = Json(ErrorResponse {
            error: error_message.to_string(),
            details: None,
        });

        (status, body).into_response()
    }
}

/// Result type alias for API handlers
pub type ApiResult<T> = Result<T, AuthError>;
