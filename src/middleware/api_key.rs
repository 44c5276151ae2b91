//! API-key gate for protected routes.

use std::sync::Arc;

use axum::extract::{FromRequestParts, Request, State};
use axum::http::request::Parts;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::errors::AppError;
use crate::keys::{serialize_instant, KeyDigest};
use crate::AppState;

pub const API_KEY_HEADER: &str = "x-api-key";

/// Validation result attached to requests that passed the gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiKeyInfo {
    pub valid: bool,
    #[serde(serialize_with = "serialize_instant")]
    pub expires_at: DateTime<Utc>,
    pub remaining_time: u64,
}

/// Reads the raw key from `x-api-key`. Blank values count as missing.
pub fn api_key_from(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|k| !k.is_empty())
}

/// Middleware: rejects the request unless `x-api-key` holds a live key.
pub async fn require_api_key(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(raw) = api_key_from(req.headers()) else {
        tracing::warn!("api key gate: missing x-api-key header");
        return Err(AppError::MissingApiKey);
    };

    let validation = state.keys.validate(raw);
    let info = match (validation.valid, validation.expires_at, validation.remaining_time) {
        (true, Some(expires_at), Some(remaining_time)) => ApiKeyInfo {
            valid: true,
            expires_at,
            remaining_time,
        },
        _ => {
            // SECURITY: log the digest prefix only, never the key
            tracing::warn!(key = %KeyDigest::of(raw).short(), "api key gate: rejected key");
            return Err(AppError::InvalidApiKey);
        }
    };

    req.extensions_mut().insert(info);
    Ok(next.run(req).await)
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for ApiKeyInfo
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<ApiKeyInfo>()
            .cloned()
            .ok_or(AppError::MissingApiKey)
    }
}
