use anyhow::Context;
use url::Url;

use crate::keys::DEFAULT_PREFIX;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    /// Prefix of issued keys. Set via API_KEY_PREFIX. Default: "bgw".
    pub key_prefix: String,
    /// Base URL of the external auth service, always ending in '/'.
    /// Only `serve` requires it.
    pub auth_url: Option<Url>,
    /// Sent as `x-api-key` to the auth service.
    pub auth_service_key: Option<String>,
    /// Environment label reported by /health.
    pub environment: String,
}

impl Config {
    pub fn require_auth_url(&self) -> anyhow::Result<&Url> {
        self.auth_url
            .as_ref()
            .context("AUTH_URL environment variable is required")
    }
}

pub fn load() -> anyhow::Result<Config> {
    dotenvy::dotenv().ok();
    from_lookup(|name| std::env::var(name).ok())
}

/// Builds a config from an arbitrary variable source.
pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> anyhow::Result<Config> {
    let non_empty = |name: &str| var(name).filter(|v| !v.trim().is_empty());

    let auth_url = non_empty("AUTH_URL")
        .map(|raw| parse_auth_url(&raw))
        .transpose()?;

    Ok(Config {
        port: var("KEYGATE_PORT")
            .and_then(|v| v.parse().ok())
            .unwrap_or(3000),
        key_prefix: non_empty("API_KEY_PREFIX").unwrap_or_else(|| DEFAULT_PREFIX.into()),
        auth_url,
        auth_service_key: non_empty("AUTH_SERVICE_KEY").or_else(|| non_empty("API_KEY")),
        environment: non_empty("KEYGATE_ENV")
            .or_else(|| non_empty("NODE_ENV"))
            .unwrap_or_else(|| "development".into()),
    })
}

/// Parses the auth base URL, appending a trailing slash so endpoint names
/// can be joined onto it.
pub fn parse_auth_url(raw: &str) -> anyhow::Result<Url> {
    let mut normalized = raw.trim().to_string();
    if !normalized.ends_with('/') {
        normalized.push('/');
    }
    let url = Url::parse(&normalized).with_context(|| format!("invalid AUTH_URL: {}", raw))?;
    if url.cannot_be_a_base() {
        anyhow::bail!("invalid AUTH_URL: {} cannot be used as a base URL", raw);
    }
    Ok(url)
}
