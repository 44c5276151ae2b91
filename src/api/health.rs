use std::sync::Arc;

use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::errors::AppError;
use crate::keys::format_instant;
use crate::AppState;

pub const API_ENDPOINT: &str = "/api/v1";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    pub status: &'static str,
    pub timestamp: String,
    /// Seconds since the process started.
    pub uptime: f64,
    pub version: &'static str,
    pub environment: String,
    pub api_endpoint: &'static str,
}

impl HealthStatus {
    pub fn now(state: &AppState, at: DateTime<Utc>) -> Self {
        Self {
            status: "OK",
            timestamp: format_instant(&at),
            uptime: state.started_at.elapsed().as_secs_f64(),
            version: env!("CARGO_PKG_VERSION"),
            environment: state.config.environment.clone(),
            api_endpoint: API_ENDPOINT,
        }
    }
}

/// GET /health
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthStatus> {
    Json(HealthStatus::now(&state, Utc::now()))
}

/// GET /status
pub async fn status() -> &'static str {
    "keygate is running"
}

/// GET /metrics: prometheus text exposition
pub async fn metrics(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, AppError> {
    let body = state.keys.render_metrics()?;
    Ok(([(CONTENT_TYPE, "text/plain; version=0.0.4")], body))
}
