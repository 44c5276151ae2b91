//! keygate: ephemeral API key service.
//!
//! Library crate shared by the binary and the integration tests in `tests/`.

use std::time::Instant;

pub mod api;
pub mod auth;
pub mod cli;
pub mod config;
pub mod errors;
pub mod keys;
pub mod metrics;
pub mod middleware;

/// Shared application state passed to handlers and middleware.
pub struct AppState {
    pub keys: keys::CredentialService,
    pub auth: auth::AuthClient,
    pub config: config::Config,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(keys: keys::CredentialService, auth: auth::AuthClient, config: config::Config) -> Self {
        Self {
            keys,
            auth,
            config,
            started_at: Instant::now(),
        }
    }
}
