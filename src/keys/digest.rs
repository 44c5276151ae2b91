use std::fmt;

use sha2::{Digest as _, Sha256};

/// SHA-256 of a raw key, hex-encoded. The only form a key is ever stored in.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyDigest(String);

impl KeyDigest {
    pub fn of(raw_key: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(raw_key.as_bytes());
        Self(hex::encode(hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Leading characters, enough to correlate log lines.
    pub fn short(&self) -> &str {
        &self.0[..12]
    }
}

impl fmt::Display for KeyDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
