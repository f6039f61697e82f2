//! HTTP-level tests for the login / status / logout / forward-auth surface.

use std::sync::{Arc, Mutex};

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, Response, StatusCode},
};
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use tower::ServiceExt;

use tinyauth::auth::{
    AuthHooks, AuthSettings, CookieSettings, SameSitePolicy, SessionProfile, User, UserStore,
    Whitelist,
};
use tinyauth::error::AuthError;
use tinyauth::{routes, AppState};

const SECRET: &str = "super-secret-api-thing-for-tests"; // It is 32 chars long

// bcrypt of "pass"
const PASS_HASH: &str = "$2a$10$AvGHLTYv3xiRJ0xV9xs3XeVIlkGTygI9nqIamFYB5Xu.5.0UWF7B6";

fn settings(whitelist: &[&str]) -> AuthSettings {
    AuthSettings {
        secret: SECRET.to_string(),
        session_ttl: Duration::seconds(3600),
        cookie: CookieSettings {
            name: "tinyauth".to_string(),
            secure: false,
            same_site: SameSitePolicy::Lax,
        },
        users: UserStore::new(vec![
            User {
                username: "user".to_string(),
                email: None,
                password_hash: PASS_HASH.to_string(),
            },
            User {
                username: "alice".to_string(),
                email: Some("alice@example.com".to_string()),
                password_hash: bcrypt::hash("wonderland", 4).unwrap(),
            },
        ]),
        whitelist: Whitelist::new(whitelist.iter().copied()),
        oauth_providers: vec!["github".to_string()],
        generic_name: "Authentik".to_string(),
        app_url: "http://tinyauth.localhost".to_string(),
        disable_continue: false,
        title: "Tinyauth".to_string(),
    }
}

fn test_state() -> AppState {
    AppState::new(settings(&[]))
}

async fn send(state: &AppState, request: Request<Body>) -> Response<Body> {
    routes::api_routes(state.clone())
        .oneshot(request)
        .await
        .unwrap()
}

fn login_request(username: &str, password: &str) -> Request<Body> {
    let body = json!({ "username": username, "password": password });
    Request::builder()
        .method(Method::POST)
        .uri("/api/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn with_cookie(method: Method, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::COOKIE, format!("tinyauth={}", token));
    }
    builder.body(Body::empty()).unwrap()
}

fn set_cookie(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get(header::SET_COOKIE)
        .map(|v| v.to_str().unwrap().to_string())
}

fn cookie_value(response: &Response<Body>) -> String {
    let raw = set_cookie(response).expect("Set-Cookie header");
    cookie::Cookie::parse(raw).unwrap().value().to_string()
}

async fn json_body(response: Response<Body>) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn login(state: &AppState, username: &str, password: &str) -> String {
    let response = send(state, login_request(username, password)).await;
    assert_eq!(response.status(), StatusCode::OK);
    cookie_value(&response)
}

#[tokio::test]
async fn test_login_status_logout() {
    let state = test_state();

    let response = send(&state, login_request("user", "pass")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let c1 = cookie_value(&response);
    assert!(!c1.is_empty());

    let response = send(&state, with_cookie(Method::GET, "/api/status", Some(&c1))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["isLoggedIn"], true);
    assert_eq!(body["username"], "user");
    assert_eq!(body["oauth"], false);
    assert_eq!(body["provider"], "username");
    assert!(!body.to_string().contains("$2a$"));

    let response = send(&state, with_cookie(Method::POST, "/api/logout", Some(&c1))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let c2 = cookie_value(&response);
    assert_ne!(c1, c2);
}

#[tokio::test]
async fn test_login_without_content_type() {
    let state = test_state();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/login")
        .body(Body::from(r#"{"username":"user","password":"pass"}"#))
        .unwrap();

    let response = send(&state, request).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(!cookie_value(&response).is_empty());
}

#[tokio::test]
async fn test_old_cookie_rejected_after_logout() {
    let state = test_state();
    let c1 = login(&state, "user", "pass").await;

    let response = send(&state, with_cookie(Method::POST, "/api/logout", Some(&c1))).await;
    let c2 = cookie_value(&response);

    for token in [&c1, &c2] {
        let response = send(&state, with_cookie(Method::GET, "/api/status", Some(token))).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}

#[tokio::test]
async fn test_login_cookie_attributes() {
    let state = test_state();
    let response = send(&state, login_request("user", "pass")).await;
    let raw = set_cookie(&response).unwrap();

    assert!(raw.starts_with("tinyauth="));
    assert!(raw.contains("HttpOnly"));
    assert!(raw.contains("SameSite=Lax"));
    assert!(raw.contains("Max-Age=3600"));
    assert!(!raw.contains("Secure"));
}

#[tokio::test]
async fn test_logout_cookie_expires_immediately() {
    let state = test_state();
    let c1 = login(&state, "user", "pass").await;
    let response = send(&state, with_cookie(Method::POST, "/api/logout", Some(&c1))).await;
    assert!(set_cookie(&response).unwrap().contains("Max-Age=0"));
}

#[tokio::test]
async fn test_wrong_password_is_unauthorized() {
    let state = test_state();
    let response = send(&state, login_request("user", "wrong")).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(set_cookie(&response).is_none());
}

#[tokio::test]
async fn test_unknown_user_looks_like_wrong_password() {
    let state = test_state();

    let unknown = send(&state, login_request("nobody", "pass")).await;
    let wrong = send(&state, login_request("user", "nope")).await;

    assert_eq!(unknown.status(), wrong.status());
    assert!(set_cookie(&unknown).is_none());
    assert_eq!(json_body(unknown).await, json_body(wrong).await);
}

#[tokio::test]
async fn test_login_by_email() {
    let state = test_state();
    let token = login(&state, "alice@example.com", "wonderland").await;

    let response = send(&state, with_cookie(Method::GET, "/api/status", Some(&token))).await;
    let body = json_body(response).await;
    assert_eq!(body["username"], "alice");
    assert_eq!(body["email"], "alice@example.com");
}

#[tokio::test]
async fn test_malformed_login_is_bad_request() {
    let state = test_state();

    let garbage = Request::builder()
        .method(Method::POST)
        .uri("/api/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    assert_eq!(send(&state, garbage).await.status(), StatusCode::BAD_REQUEST);

    let response = send(&state, login_request("user", "")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = send(&state, login_request("", "pass")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_status_without_cookie() {
    let state = test_state();
    let response = send(&state, with_cookie(Method::GET, "/api/status", None)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_status_with_garbage_cookie() {
    let state = test_state();
    let response = send(
        &state,
        with_cookie(Method::GET, "/api/status", Some("garbage")),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_status_with_expired_session() {
    let state = test_state();
    let token = state
        .sessions
        .issue_at(
            "user",
            SessionProfile::default(),
            Duration::seconds(60),
            Utc::now() - Duration::seconds(120),
        )
        .unwrap();

    let response = send(&state, with_cookie(Method::GET, "/api/status", Some(&token))).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_session_from_other_secret_rejected() {
    let state = test_state();
    let mut other = settings(&[]);
    other.secret = "another-secret-another-secret-xx".to_string();
    let other = AppState::new(other);
    let token = login(&other, "user", "pass").await;

    let response = send(&state, with_cookie(Method::GET, "/api/status", Some(&token))).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_is_idempotent() {
    let state = test_state();

    let response = send(&state, with_cookie(Method::POST, "/api/logout", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(!cookie_value(&response).is_empty());

    let response = send(
        &state,
        with_cookie(Method::POST, "/api/logout", Some("garbage")),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_ne!(cookie_value(&response), "garbage");
}

#[tokio::test]
async fn test_forward_auth_with_session() {
    let state = test_state();
    let token = login(&state, "user", "pass").await;

    let response = send(&state, with_cookie(Method::GET, "/api/auth", Some(&token))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["remote-user"], "user");
}

#[tokio::test]
async fn test_forward_auth_without_session() {
    let state = test_state();

    let response = send(&state, with_cookie(Method::GET, "/api/auth", None)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let proxied = Request::builder()
        .uri("/api/auth")
        .header("x-forwarded-host", "whoami.localhost")
        .header("x-forwarded-proto", "https")
        .header("x-forwarded-uri", "/dashboard")
        .body(Body::empty())
        .unwrap();
    let response = send(&state, proxied).await;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        response.headers()[header::LOCATION],
        "http://tinyauth.localhost/?redirect_uri=https%3A%2F%2Fwhoami.localhost%2Fdashboard"
    );
}

#[tokio::test]
async fn test_oauth_session_respects_whitelist() {
    let state = AppState::new(settings(&["alice@example.com"]));

    let token = state.oauth_session("alice@example.com", "github").unwrap();
    let response = send(&state, with_cookie(Method::GET, "/api/status", Some(&token))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["oauth"], true);
    assert_eq!(body["provider"], "github");
    assert_eq!(body["username"], "alice@example.com");

    assert!(matches!(
        state.oauth_session("Alice@example.com", "github"),
        Err(AuthError::EmailNotAuthorized)
    ));
}

#[tokio::test]
async fn test_oauth_empty_whitelist_allows_all() {
    let state = test_state();
    assert!(state.oauth_session("anyone@example.com", "google").is_ok());
}

#[tokio::test]
async fn test_oauth_empty_email_rejected() {
    let state = test_state();
    assert!(matches!(
        state.oauth_session("", "google"),
        Err(AuthError::EmailNotAuthorized)
    ));
}

#[tokio::test]
async fn test_generic_name_follows_generic_provider() {
    let state = test_state();
    let token = login(&state, "user", "pass").await;
    let response = send(&state, with_cookie(Method::GET, "/api/status", Some(&token))).await;
    assert_eq!(json_body(response).await["genericName"], "");

    let mut generic = settings(&[]);
    generic.oauth_providers.push("generic".to_string());
    let state = AppState::new(generic);

    let token = state.oauth_session("bob@example.com", "generic").unwrap();
    let response = send(&state, with_cookie(Method::GET, "/api/status", Some(&token))).await;
    assert_eq!(json_body(response).await["genericName"], "Authentik");

    let response = send(&state, with_cookie(Method::GET, "/api/app", None)).await;
    assert_eq!(json_body(response).await["genericName"], "Authentik");
}

#[tokio::test]
async fn test_app_context() {
    let state = test_state();
    let response = send(&state, with_cookie(Method::GET, "/api/app", None)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["title"], "Tinyauth");
    assert_eq!(body["configuredProviders"], json!(["username", "github"]));
}

#[tokio::test]
async fn test_healthcheck() {
    let state = test_state();
    let response = send(&state, with_cookie(Method::GET, "/api/healthcheck", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["status"], "ok");
}

#[derive(Default)]
struct RecordingHooks {
    events: Mutex<Vec<String>>,
}

impl AuthHooks for RecordingHooks {
    fn before_login(&self, identifier: &str) {
        self.events.lock().unwrap().push(format!("before:{}", identifier));
    }

    fn after_login(&self, subject: &str, success: bool) {
        self.events
            .lock()
            .unwrap()
            .push(format!("login:{}:{}", subject, success));
    }

    fn after_logout(&self, subject: Option<&str>) {
        self.events
            .lock()
            .unwrap()
            .push(format!("logout:{}", subject.unwrap_or("-")));
    }
}

#[tokio::test]
async fn test_hooks_are_called() {
    let hooks = Arc::new(RecordingHooks::default());
    let state = test_state().with_hooks(hooks.clone());

    send(&state, login_request("user", "wrong")).await;
    let token = login(&state, "user", "pass").await;
    send(&state, with_cookie(Method::POST, "/api/logout", Some(&token))).await;
    send(&state, with_cookie(Method::POST, "/api/logout", None)).await;

    let events = hooks.events.lock().unwrap().clone();
    assert_eq!(
        events,
        vec![
            "before:user",
            "login:user:false",
            "before:user",
            "login:user:true",
            "logout:user",
            "logout:-",
        ]
    );
}
