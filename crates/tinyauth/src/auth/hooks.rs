//! Side-effect hooks around login and logout.
//!
//! Hooks run synchronously inside the handler. Their outcome never affects
//! the authentication decision.

pub trait AuthHooks: Send + Sync {
    fn before_login(&self, _identifier: &str) {}

    fn after_login(&self, _subject: &str, _success: bool) {}

    /// `subject` is `None` when the presented cookie was already invalid.
    fn after_logout(&self, _subject: Option<&str>) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHooks;

impl AuthHooks for NoopHooks {}
