//! Authentication HTTP handlers.

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, HeaderName, StatusCode},
    response::{IntoResponse, Redirect, Response},
    Extension, Json,
};
use chrono::Duration;
use shared_types::{AppContextResponse, HealthResponse, MessageResponse};

use crate::error::{ApiResult, AuthError};
use crate::AppState;

use super::{
    cookies::{build_session_cookie, extract_cookie},
    middleware::extract_session,
    types::{LoginRequest, SessionClaims, SessionProfile, UserContextResponse},
};

const REMOTE_USER: HeaderName = HeaderName::from_static("remote-user");

/// Username/password login.
///
/// Unknown users and wrong passwords produce the same 401. The body is
/// parsed as JSON whatever its `Content-Type`.
pub async fn login(State(state): State<AppState>, body: Bytes) -> ApiResult<Response> {
    let LoginRequest { username, password } = serde_json::from_slice(&body)?;

    if username.is_empty() || password.is_empty() {
        return Err(AuthError::malformed("username and password are required"));
    }

    state.hooks.before_login(&username);

    // bcrypt is deliberately slow; keep it off the async workers
    let authenticator = state.authenticator.clone();
    let identifier = username.clone();
    let outcome =
        tokio::task::spawn_blocking(move || authenticator.authenticate(&identifier, &password))
            .await
            .map_err(|e| AuthError::Internal(anyhow::anyhow!("Password check aborted: {}", e)))?;

    let user = match outcome {
        Ok(user) => user,
        Err(err) => {
            tracing::warn!("Failed login attempt for: {}", username);
            state.hooks.after_login(&username, false);
            return Err(err);
        }
    };

    let ttl = state.sessions.ttl();
    let profile = SessionProfile {
        email: user.email.clone(),
        provider: None,
    };
    let token = state.sessions.issue_with(&user.username, profile, ttl)?;
    let cookie = build_session_cookie(&state.settings.cookie, &token, ttl);

    tracing::info!("Successful login for: {}", user.username);
    state.hooks.after_login(&user.username, true);

    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(MessageResponse::new("Logged in")),
    )
        .into_response())
}

/// Profile of the current session holder.
///
/// Mounted behind [`super::require_session`].
pub async fn status(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
) -> Json<UserContextResponse> {
    let oauth = claims.provider.is_some();

    Json(UserContextResponse {
        is_logged_in: true,
        username: claims.sub,
        email: claims.email,
        oauth,
        provider: claims.provider.unwrap_or_else(|| "username".to_string()),
        disable_continue: state.settings.disable_continue,
        title: state.settings.title.clone(),
        generic_name: state.settings.generic_provider_name(),
    })
}

/// Logout - replace the session cookie with a dead one.
///
/// Always succeeds, whether or not the presented cookie was live.
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<Response> {
    let current = extract_cookie(&headers, &state.settings.cookie.name).unwrap_or_default();
    let subject = state.sessions.validate(&current).ok().map(|claims| claims.sub);

    let replacement = state.sessions.invalidate(&current)?;
    let cookie = build_session_cookie(&state.settings.cookie, &replacement, Duration::zero());

    match &subject {
        Some(subject) => tracing::info!("Logged out: {}", subject),
        None => tracing::debug!("Logout without a live session"),
    }
    state.hooks.after_logout(subject.as_deref());

    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(MessageResponse::new("Logged out")),
    )
        .into_response())
}

/// Forward-auth decision for reverse proxies.
///
/// A live session answers 200 with `Remote-User`. Otherwise browsers coming
/// through a proxy (`X-Forwarded-Host` present) are sent to the login page,
/// and everything else gets 401.
pub async fn forward_auth(State(state): State<AppState>, headers: HeaderMap) -> Response {
    match extract_session(&headers, &state) {
        Ok(claims) => (StatusCode::OK, [(REMOTE_USER, claims.sub)]).into_response(),
        Err(err) => match login_redirect(&headers, &state.settings.app_url) {
            Some(location) => Redirect::temporary(&location).into_response(),
            None => err.into_response(),
        },
    }
}

pub async fn app_context(State(state): State<AppState>) -> Json<AppContextResponse> {
    Json(AppContextResponse {
        title: state.settings.title.clone(),
        disable_continue: state.settings.disable_continue,
        configured_providers: state.settings.configured_providers(),
        generic_name: state.settings.generic_provider_name(),
    })
}

pub async fn healthcheck() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

fn login_redirect(headers: &HeaderMap, app_url: &str) -> Option<String> {
    let forwarded = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());

    let host = forwarded("x-forwarded-host")?;
    let proto = forwarded("x-forwarded-proto").unwrap_or("http");
    let uri = forwarded("x-forwarded-uri").unwrap_or("/");
    let target = format!("{}://{}{}", proto, host, uri);

    Some(format!(
        "{}/?redirect_uri={}",
        app_url.trim_end_matches('/'),
        urlencoding::encode(&target)
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_login_redirect_requires_forwarded_host() {
        assert_eq!(login_redirect(&HeaderMap::new(), "http://auth.local"), None);
    }

    #[test]
    fn test_login_redirect_encodes_target() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-host", HeaderValue::from_static("app.local"));
        headers.insert("x-forwarded-proto", HeaderValue::from_static("https"));
        headers.insert("x-forwarded-uri", HeaderValue::from_static("/a?b=c"));

        let location = login_redirect(&headers, "http://auth.local/").unwrap();
        assert_eq!(
            location,
            "http://auth.local/?redirect_uri=https%3A%2F%2Fapp.local%2Fa%3Fb%3Dc"
        );
    }
}
