use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::Zeroize;

use super::KeyError;

/// Prefix used when none is configured.
pub const DEFAULT_PREFIX: &str = "bgw";

/// 256 bits.
const ENTROPY_BYTES: usize = 32;

/// Mints raw keys of the form `{prefix}_{64 hex chars}`.
#[derive(Debug, Clone)]
pub struct TokenGenerator {
    prefix: String,
}

impl TokenGenerator {
    /// Blank prefixes fall back to [`DEFAULT_PREFIX`].
    pub fn new(prefix: Option<&str>) -> Self {
        let prefix = prefix
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .unwrap_or(DEFAULT_PREFIX);
        Self {
            prefix: prefix.to_string(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Draws fresh bytes from the OS. There is no weaker fallback: if the OS
    /// source fails, so does the call.
    pub fn generate(&self) -> Result<String, KeyError> {
        let mut bytes = [0u8; ENTROPY_BYTES];
        OsRng.try_fill_bytes(&mut bytes)?;
        let key = format!("{}_{}", self.prefix, hex::encode(bytes));
        bytes.zeroize();
        Ok(key)
    }
}

impl Default for TokenGenerator {
    fn default() -> Self {
        Self::new(None)
    }
}
