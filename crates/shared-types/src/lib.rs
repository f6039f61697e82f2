use serde::{Deserialize, Serialize};

/// Credentials posted to `/api/login`.
///
/// `username` carries the login identifier, which may be either the
/// configured username or the configured email of a user.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Public profile of the session holder returned by `/api/status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserContextResponse {
    pub is_logged_in: bool,
    pub username: String,
    pub email: Option<String>,
    pub oauth: bool,
    pub provider: String,
    pub disable_continue: bool,
    pub title: String,
    /// Display name of the generic OAuth provider; empty when none is configured
    pub generic_name: String,
}

/// Unauthenticated bootstrap data for the login UI (`/api/app`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppContextResponse {
    pub title: String,
    pub disable_continue: bool,
    pub configured_providers: Vec<String>,
    pub generic_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}
