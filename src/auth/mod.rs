//! Thin proxy to the external user/auth service.

pub mod client;
pub mod types;

pub use client::AuthClient;
pub use types::{AuthResponse, LoginInput, RefreshInput, RegisterInput, TokenStatus, User};
