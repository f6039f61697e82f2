//! Session extraction and the route guard built on it.

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::error::AuthError;
use crate::AppState;

use super::cookies::extract_cookie;
use super::types::SessionClaims;

/// Middleware that requires a live session.
///
/// On success the [`SessionClaims`] are inserted into the request extensions.
/// Use with `axum::middleware::from_fn_with_state`.
pub async fn require_session(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    match extract_session(request.headers(), &state) {
        Ok(claims) => {
            request.extensions_mut().insert(claims);
            next.run(request).await
        }
        Err(err) => err.into_response(),
    }
}

/// Read the session cookie and validate it.
pub fn extract_session(headers: &HeaderMap, state: &AppState) -> Result<SessionClaims, AuthError> {
    let token = extract_cookie(headers, &state.settings.cookie.name)
        .ok_or(AuthError::InvalidSession)?;

    state.sessions.validate(&token)
}
