//! Startup configuration.
//!
//! Every option is a command-line flag that can also be set through the
//! environment (or a `.env` file loaded by `main`). The parsed [`AppConfig`]
//! is validated once and turned into the immutable [`AuthSettings`].

use std::path::{Path, PathBuf};

use chrono::Duration;
use clap::Parser;
use thiserror::Error;

use crate::auth::{
    users::UserParseError, AuthSettings, CookieSettings, SameSitePolicy, UserStore, Whitelist,
};

/// Required secret length in bytes.
pub const SECRET_LEN: usize = 32;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("a secret is required (--secret or --secret-file)")]
    MissingSecret,

    #[error("secret must be exactly 32 bytes, got {0}")]
    SecretLength(usize),

    #[error("app url {0:?} must start with http:// or https://")]
    AppUrl(String),

    #[error("session expiry must be greater than zero")]
    SessionExpiry,

    #[error("SameSite=None cookies require --cookie-secure")]
    InsecureSameSiteNone,

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Users(#[from] UserParseError),
}

#[derive(Debug, Clone, Parser)]
#[command(name = "tinyauth")]
#[command(about = "Forward-auth server with cookie sessions")]
pub struct AppConfig {
    /// Address to bind the HTTP server to.
    #[arg(long, default_value = "0.0.0.0", env = "ADDRESS")]
    pub address: String,

    /// Port to bind the HTTP server to.
    #[arg(long, default_value_t = 3000, env = "PORT")]
    pub port: u16,

    /// Secret used to sign session cookies. Must be 32 bytes.
    #[arg(long, env = "SECRET", hide_env_values = true)]
    pub secret: Option<String>,

    /// File containing the session secret. Takes precedence over --secret.
    #[arg(long, env = "SECRET_FILE")]
    pub secret_file: Option<PathBuf>,

    /// Public URL of this server; unauthenticated proxied requests are
    /// redirected here.
    #[arg(long, env = "APP_URL")]
    pub app_url: String,

    /// Comma-separated users, each `username:hash` or `username:email:hash`.
    #[arg(long, env = "USERS", value_delimiter = ',')]
    pub users: Vec<String>,

    /// File with one user entry per line, appended to --users.
    #[arg(long, env = "USERS_FILE")]
    pub users_file: Option<PathBuf>,

    #[arg(long, default_value = "tinyauth", env = "COOKIE_NAME")]
    pub cookie_name: String,

    /// Mark the session cookie Secure (HTTPS only).
    #[arg(long, default_value_t = false, env = "COOKIE_SECURE")]
    pub cookie_secure: bool,

    #[arg(long, value_enum, default_value_t = SameSitePolicy::Lax, env = "COOKIE_SAME_SITE")]
    pub cookie_same_site: SameSitePolicy,

    /// Session lifetime in seconds.
    #[arg(long, default_value_t = 86400, env = "SESSION_EXPIRY")]
    pub session_expiry: u32,

    /// Skip the "continue" confirmation screen after login.
    #[arg(long, default_value_t = false, env = "DISABLE_CONTINUE")]
    pub disable_continue: bool,

    /// Comma-separated emails allowed through OAuth. Empty allows everyone.
    #[arg(long, env = "OAUTH_WHITELIST", value_delimiter = ',')]
    pub oauth_whitelist: Vec<String>,

    /// Comma-separated names of the OAuth providers handled upstream.
    #[arg(long, env = "OAUTH_PROVIDERS", value_delimiter = ',')]
    pub oauth_providers: Vec<String>,

    /// Display name of the `generic` OAuth provider.
    #[arg(long, default_value = "Generic", env = "GENERIC_NAME")]
    pub generic_name: String,

    #[arg(long, default_value = "Tinyauth", env = "TITLE")]
    pub title: String,

    /// Default tracing filter; RUST_LOG overrides it.
    #[arg(long, default_value = "info", env = "LOG_LEVEL")]
    pub log_level: String,
}

impl AppConfig {
    /// Check every constraint and build the settings the auth core runs on.
    pub fn into_settings(self) -> Result<AuthSettings, ConfigError> {
        let secret = match &self.secret_file {
            Some(path) => read_file(path)?.trim().to_string(),
            None => self.secret.clone().ok_or(ConfigError::MissingSecret)?,
        };
        if secret.len() != SECRET_LEN {
            return Err(ConfigError::SecretLength(secret.len()));
        }

        if !(self.app_url.starts_with("http://") || self.app_url.starts_with("https://")) {
            return Err(ConfigError::AppUrl(self.app_url));
        }

        if self.session_expiry == 0 {
            return Err(ConfigError::SessionExpiry);
        }

        if self.cookie_same_site == SameSitePolicy::None && !self.cookie_secure {
            return Err(ConfigError::InsecureSameSiteNone);
        }

        let mut entries = self.users;
        if let Some(path) = &self.users_file {
            entries.extend(read_file(path)?.lines().map(str::to_string));
        }
        let users = UserStore::parse(entries)?;

        let whitelist = Whitelist::new(
            self.oauth_whitelist
                .into_iter()
                .map(|e| e.trim().to_string()),
        );

        let oauth_providers = self
            .oauth_providers
            .into_iter()
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect();

        Ok(AuthSettings {
            secret,
            session_ttl: Duration::seconds(i64::from(self.session_expiry)),
            cookie: CookieSettings {
                name: self.cookie_name,
                secure: self.cookie_secure,
                same_site: self.cookie_same_site,
            },
            users,
            whitelist,
            oauth_providers,
            generic_name: self.generic_name,
            app_url: self.app_url,
            disable_continue: self.disable_continue,
            title: self.title,
        })
    }
}

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}
