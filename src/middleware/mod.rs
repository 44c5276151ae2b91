pub mod api_key;
pub mod headers;

pub use api_key::{require_api_key, ApiKeyInfo, API_KEY_HEADER};
