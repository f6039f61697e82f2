//! Auth-related types and settings.

use std::fmt;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use super::authenticator::Whitelist;
use super::cookies::CookieSettings;
use super::users::UserStore;

/// Provider name under which a self-hosted OAuth server is configured.
pub const GENERIC_PROVIDER: &str = "generic";

// Re-export shared types for convenience
pub use shared_types::{LoginRequest, UserContextResponse};

/// A configured identity. Immutable after load.
#[derive(Clone, PartialEq, Eq)]
pub struct User {
    pub username: String,
    pub email: Option<String>,
    /// bcrypt hash (`$2a$`, `$2b$` or `$2y$`)
    pub password_hash: String,
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("username", &self.username)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// Claims carried in the signed session cookie.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject (username, or email for OAuth sessions)
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// OAuth provider name; absent for username/password sessions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    /// Issued at timestamp
    pub iat: i64,
    /// Expiration timestamp
    pub exp: i64,
    /// Per-session nonce
    pub jti: String,
}

/// Optional profile fields bound into a new session.
#[derive(Debug, Clone, Default)]
pub struct SessionProfile {
    pub email: Option<String>,
    pub provider: Option<String>,
}

/// Immutable settings shared by every request.
///
/// Built once from [`crate::config::AppConfig`] and never mutated afterwards.
#[derive(Clone)]
pub struct AuthSettings {
    pub secret: String,
    pub session_ttl: Duration,
    pub cookie: CookieSettings,
    pub users: UserStore,
    pub whitelist: Whitelist,
    pub oauth_providers: Vec<String>,
    /// Display name for the `generic` OAuth provider
    pub generic_name: String,
    pub app_url: String,
    pub disable_continue: bool,
    pub title: String,
}

impl fmt::Debug for AuthSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSettings")
            .field("secret", &"<redacted>")
            .field("session_ttl", &self.session_ttl)
            .field("cookie", &self.cookie)
            .field("users", &self.users.len())
            .field("whitelist", &self.whitelist.len())
            .field("oauth_providers", &self.oauth_providers)
            .field("generic_name", &self.generic_name)
            .field("app_url", &self.app_url)
            .field("disable_continue", &self.disable_continue)
            .field("title", &self.title)
            .finish()
    }
}

impl AuthSettings {
    /// Login methods to advertise to the UI.
    pub fn configured_providers(&self) -> Vec<String> {
        let mut providers = Vec::with_capacity(self.oauth_providers.len() + 1);
        if !self.users.is_empty() {
            providers.push("username".to_string());
        }
        providers.extend(self.oauth_providers.iter().cloned());
        providers
    }

    /// Generic provider display name, empty unless `generic` is configured.
    pub fn generic_provider_name(&self) -> String {
        if self.oauth_providers.iter().any(|p| p == GENERIC_PROVIDER) {
            self.generic_name.clone()
        } else {
            String::new()
        }
    }
}
