/// HTTP client for the external auth service.
/// Uses reqwest-middleware so transient failures (connect errors, 5xx, 429)
/// are retried before they surface to the caller. Register is not idempotent
/// and goes out exactly once.
use std::time::Duration;

use axum::http::StatusCode;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware, RequestBuilder};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use serde::{Deserialize, Serialize};
use url::Url;

use super::types::{
    AuthResponse, AuthServiceResponse, LoginInput, RefreshInput, RegisterInput, TokenStatus,
    LOGIN_MESSAGE, REGISTER_MESSAGE,
};
use crate::errors::AppError;

const SERVICE_KEY_HEADER: &str = "x-api-key";
const DEFAULT_REJECTION: &str = "Authentication failed";

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

#[derive(Clone)]
pub struct AuthClient {
    client: ClientWithMiddleware,
    once: ClientWithMiddleware,
    base: Url,
    service_key: Option<String>,
}

impl AuthClient {
    /// `base` must end in '/' (see [`crate::config::parse_auth_url`]).
    pub fn new(base: Url, service_key: Option<String>) -> anyhow::Result<Self> {
        let reqwest_client = reqwest::Client::builder()
            .use_rustls_tls()
            .timeout(Duration::from_secs(15))
            .connect_timeout(Duration::from_secs(5))
            .build()?;

        // Two retries, 50ms..500ms apart. Login is interactive, so keep it short.
        let retry_policy = ExponentialBackoff::builder()
            .retry_bounds(Duration::from_millis(50), Duration::from_millis(500))
            .build_with_max_retries(2);

        let once = ClientBuilder::new(reqwest_client.clone()).build();
        let client = ClientBuilder::new(reqwest_client)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Ok(Self {
            client,
            once,
            base,
            service_key,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    pub async fn login(&self, input: &LoginInput) -> Result<AuthResponse, AppError> {
        input.validate()?;
        let data = self.post_json(&self.client, "login", input).await?;
        tracing::info!(user_id = ?data.id.as_deref().or(data.user_id.as_deref()), "login forwarded");
        Ok(data.into_session(LOGIN_MESSAGE))
    }

    pub async fn register(&self, input: &RegisterInput) -> Result<AuthResponse, AppError> {
        input.validate()?;
        let data = self.post_json(&self.once, "register", input).await?;
        Ok(data.into_session(REGISTER_MESSAGE))
    }

    /// Every failure collapses to [`AppError::RefreshFailed`].
    pub async fn refresh(&self, refresh_token: &str) -> Result<AuthResponse, AppError> {
        let input = RefreshInput {
            refresh_token: refresh_token.to_string(),
        };
        match self.post_json(&self.client, "refresh", &input).await {
            Ok(data) => Ok(data.into_refreshed()),
            Err(e) => {
                tracing::warn!("Token refresh failed: {}", e);
                Err(AppError::RefreshFailed)
            }
        }
    }

    pub async fn validate_token(&self, token: &str) -> Result<TokenStatus, AppError> {
        let url = self.endpoint("validate")?;
        let resp = self
            .with_service_key(self.client.get(url))
            .header(AUTHORIZATION, format!("Bearer {}", token))
            .send()
            .await
            .map_err(|e| {
                tracing::warn!("Token validation request failed: {}", e);
                AppError::TokenValidationFailed
            })?;

        if !resp.status().is_success() {
            tracing::debug!(status = %resp.status(), "auth service refused token");
            return Err(AppError::TokenValidationFailed);
        }

        resp.json::<TokenStatus>().await.map_err(|e| {
            tracing::warn!("Malformed token validation response: {}", e);
            AppError::TokenValidationFailed
        })
    }

    fn endpoint(&self, name: &str) -> Result<Url, AppError> {
        self.base
            .join(name)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("bad auth endpoint {}: {}", name, e)))
    }

    fn with_service_key(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.service_key {
            Some(key) => req.header(SERVICE_KEY_HEADER, key),
            None => req,
        }
    }

    async fn post_json<T: Serialize>(
        &self,
        client: &ClientWithMiddleware,
        name: &str,
        body: &T,
    ) -> Result<AuthServiceResponse, AppError> {
        let url = self.endpoint(name)?;
        let payload = serde_json::to_vec(body).map_err(anyhow::Error::from)?;

        let resp = self
            .with_service_key(self.client.post(url))
            .header(CONTENT_TYPE, "application/json")
            .body(payload)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(endpoint = name, "Auth service request failed: {}", e);
                AppError::ServiceUnavailable
            })?;

        let status = resp.status();
        if status.is_success() {
            return resp.json::<AuthServiceResponse>().await.map_err(|e| {
                tracing::warn!(endpoint = name, "Malformed auth service response: {}", e);
                AppError::Upstream(format!("malformed response from auth service: {}", e))
            });
        }

        if status.as_u16() == 401 {
            return Err(AppError::InvalidCredentials);
        }

        let message = resp
            .json::<ErrorBody>()
            .await
            .ok()
            .and_then(|b| b.message)
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| DEFAULT_REJECTION.to_string());

        let status = match StatusCode::from_u16(status.as_u16()) {
            Ok(s) if s.is_client_error() => s,
            _ => StatusCode::BAD_GATEWAY,
        };
        tracing::debug!(endpoint = name, status = %status, "auth service rejected request");
        Err(AppError::AuthRejected { status, message })
    }
}
