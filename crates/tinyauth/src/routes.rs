use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::auth;
use crate::AppState;

pub fn api_routes(state: AppState) -> Router {
    let protected = Router::new()
        .route("/api/status", get(auth::status))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_session,
        ));

    Router::new()
        .route("/api/healthcheck", get(auth::healthcheck))
        .route("/api/app", get(auth::app_context))
        // Session lifecycle
        .route("/api/login", post(auth::login))
        .route("/api/logout", post(auth::logout))
        // Forward-auth check for reverse proxies
        .route("/api/auth", get(auth::forward_auth))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
