use thiserror::Error;

/// Errors raised by the key engine.
///
/// Unknown or expired keys are not errors; validation reports them as a
/// negative [`KeyValidation`](super::KeyValidation).
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("invalid duration: {0} (expected one of 1h, 24h, 7d, 30d)")]
    InvalidDuration(String),

    /// Two tokens hashed to the same digest while the first was still live.
    #[error("digest collision with an active key")]
    DigestCollision,

    #[error("secure randomness unavailable: {0}")]
    Entropy(#[from] rand::Error),
}

impl KeyError {
    /// Machine-readable code for API responses.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidDuration(_) => "invalid_duration",
            Self::DigestCollision => "digest_collision",
            Self::Entropy(_) => "entropy_unavailable",
        }
    }
}
