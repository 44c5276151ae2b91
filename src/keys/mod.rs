//! Ephemeral API key engine.
//!
//! Keys are random `{prefix}_{hex}` strings. Only their SHA-256 digest is
//! kept, alongside issue/expiry times. Each key has a reclamation timer so
//! memory stays bounded even if nobody validates an expired key again.

pub mod clock;
pub mod digest;
pub mod duration;
pub mod error;
pub mod generator;
pub mod model;
pub mod scheduler;
pub mod service;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use digest::KeyDigest;
pub use duration::KeyDuration;
pub use error::KeyError;
pub use generator::{TokenGenerator, DEFAULT_PREFIX};
pub use model::{format_instant, CredentialRecord, IssuedKey, KeyValidation};
pub(crate) use model::serialize_instant;
pub use scheduler::{ExpireCallback, ExpiryScheduler, TokioScheduler};
pub use service::CredentialService;
pub use store::CredentialStore;
