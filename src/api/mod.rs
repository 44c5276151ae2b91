use std::sync::Arc;

use axum::{
    http::StatusCode,
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::middleware::headers;
use crate::middleware::require_api_key;
use crate::AppState;

pub mod auth;
pub mod health;
pub mod keys;

/// Build the versioned API router.
/// All routes are relative: the caller mounts this under `/api/v1`.
pub fn api_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    let gated = Router::new()
        .route("/keys/me", get(keys::current_key))
        .route_layer(middleware::from_fn_with_state(state, require_api_key));

    Router::new()
        .route(
            "/keys",
            post(keys::generate_key).delete(keys::revoke_key),
        )
        .route("/keys/validate", post(keys::validate_key))
        .route("/auth/login", post(auth::login))
        .route("/auth/register", post(auth::register))
        .route("/auth/refresh", post(auth::refresh))
        .route("/auth/validate", get(auth::validate))
        .merge(gated)
        .fallback(fallback_404)
}

async fn fallback_404() -> StatusCode {
    StatusCode::NOT_FOUND
}

/// The full application: health, metrics and `/api/v1`, with request ids and
/// security headers on every response.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(|| async { "ok" }))
        .route("/health", get(health::health))
        .route("/status", get(health::status))
        .route("/metrics", get(health::metrics))
        .nest("/api/v1", api_router(state.clone()))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(headers::request_id))
        .layer(middleware::from_fn(headers::security_headers))
}
