//! Forward-auth server: verifies credentials against a static user list,
//! gates OAuth identities by email whitelist, and keeps sessions in signed
//! client-side cookies.

use std::sync::Arc;

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;

use auth::{
    AuthHooks, AuthSettings, Authenticator, NoopHooks, SessionManager, SessionProfile,
};
use error::AuthError;

/// Shared application state.
///
/// Everything except the session revocation list is read-only after startup.
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<AuthSettings>,
    pub authenticator: Arc<Authenticator>,
    pub sessions: Arc<SessionManager>,
    pub hooks: Arc<dyn AuthHooks>,
}

impl AppState {
    pub fn new(settings: AuthSettings) -> Self {
        let authenticator = Authenticator::new(settings.users.clone(), settings.whitelist.clone());
        let sessions = SessionManager::new(settings.secret.as_bytes(), settings.session_ttl);

        Self {
            settings: Arc::new(settings),
            authenticator: Arc::new(authenticator),
            sessions: Arc::new(sessions),
            hooks: Arc::new(NoopHooks),
        }
    }

    pub fn with_hooks(mut self, hooks: Arc<dyn AuthHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    /// Issue a session for an identity verified by an external OAuth
    /// provider, if its email is non-empty and whitelisted.
    pub fn oauth_session(&self, email: &str, provider: &str) -> Result<String, AuthError> {
        if email.is_empty() || !self.authenticator.is_email_authorized(email) {
            tracing::warn!("Unauthorized OAuth login attempt from: {}", email);
            return Err(AuthError::EmailNotAuthorized);
        }

        let profile = SessionProfile {
            email: Some(email.to_string()),
            provider: Some(provider.to_string()),
        };
        let token = self
            .sessions
            .issue_with(email, profile, self.sessions.ttl())?;

        tracing::info!("Successful {} login for: {}", provider, email);
        Ok(token)
    }
}
