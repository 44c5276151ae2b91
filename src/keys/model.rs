use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use super::KeyDigest;

/// Message returned alongside a freshly issued key.
pub const ISSUED_MESSAGE: &str = "API key generated successfully";

/// Server-side state for one issued key. Holds no part of the raw key.
#[derive(Debug, Clone)]
pub struct CredentialRecord {
    pub digest: KeyDigest,
    pub description: Option<String>,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    /// Flipped to false once, immediately before the record is dropped.
    pub active: bool,
}

impl CredentialRecord {
    pub fn new(
        digest: KeyDigest,
        description: Option<String>,
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            digest,
            description,
            issued_at,
            expires_at,
            active: true,
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Whole seconds from `now` until `expires_at`, floored and never negative.
///
/// Issuance (`expiresIn`) and validation (`remainingTime`) both go through
/// here so the two agree exactly at the same instant.
pub fn remaining_secs(now: DateTime<Utc>, expires_at: DateTime<Utc>) -> u64 {
    (expires_at - now).num_seconds().max(0) as u64
}

/// ISO-8601 UTC with millisecond precision, e.g. `2024-01-01T01:00:00.000Z`.
pub fn format_instant(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub(crate) fn serialize_instant<S: serde::Serializer>(
    at: &DateTime<Utc>,
    s: S,
) -> Result<S::Ok, S::Error> {
    s.serialize_str(&format_instant(at))
}

fn serialize_opt_instant<S: serde::Serializer>(
    at: &Option<DateTime<Utc>>,
    s: S,
) -> Result<S::Ok, S::Error> {
    match at {
        Some(at) => serialize_instant(at, s),
        None => s.serialize_none(),
    }
}

/// Result of a successful issue. The only place the raw key is ever exposed.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedKey {
    #[serde(rename = "apiKey")]
    pub token: String,
    #[serde(serialize_with = "serialize_instant")]
    pub expires_at: DateTime<Utc>,
    pub expires_in: u64,
    pub message: String,
}

/// Outcome of validating a raw key.
///
/// `expires_at` and `remaining_time` are only present for valid keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyValidation {
    pub valid: bool,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_opt_instant"
    )]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_time: Option<u64>,
}

impl KeyValidation {
    pub fn invalid() -> Self {
        Self {
            valid: false,
            expires_at: None,
            remaining_time: None,
        }
    }

    pub fn valid(expires_at: DateTime<Utc>, remaining_time: u64) -> Self {
        Self {
            valid: true,
            expires_at: Some(expires_at),
            remaining_time: Some(remaining_time),
        }
    }
}
