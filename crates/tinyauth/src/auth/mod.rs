//! Authentication core: credential checks, signed cookie sessions, and the
//! HTTP handlers that bind them together.
//!
//! This module provides:
//! - bcrypt password verification against a static user list
//! - Email whitelist checks for externally authenticated identities
//! - HS256 session tokens with expiry and logout revocation
//! - `require_session` middleware and the forward-auth endpoint

pub mod authenticator;
pub mod cookies;
mod handlers;
pub mod hooks;
mod middleware;
pub mod session;
pub mod types;
pub mod users;

pub use authenticator::{Authenticator, Whitelist};
pub use cookies::{build_session_cookie, extract_cookie, CookieSettings, SameSitePolicy};
pub use handlers::{app_context, forward_auth, healthcheck, login, logout, status};
pub use hooks::{AuthHooks, NoopHooks};
pub use middleware::{extract_session, require_session};
pub use session::SessionManager;
pub use types::{AuthSettings, SessionClaims, SessionProfile, User};
pub use users::UserStore;
