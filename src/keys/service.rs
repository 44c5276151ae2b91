//! Issue / validate façade over the store, scheduler and generator.
//!
//! A key moves through exactly two states: issued (stored, timer armed) and
//! expired (removed). Removal happens on whichever comes first: the timer
//! firing, a validation that observes `now >= expires_at`, or an explicit
//! revoke. All three go through [`Inner::evict`], which cancels the timer and
//! deletes the record under the store's per-digest lock.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::metrics::KeyMetrics;

use super::model::{remaining_secs, ISSUED_MESSAGE};
use super::{
    Clock, CredentialRecord, CredentialStore, ExpireCallback, ExpiryScheduler, IssuedKey,
    KeyDigest, KeyDuration, KeyError, KeyValidation, SystemClock, TokenGenerator, TokioScheduler,
};

/// Why a record left the store. Used as a metric label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Eviction {
    Timer,
    Lazy,
    Revoke,
}

impl Eviction {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Timer => "timer",
            Self::Lazy => "lazy",
            Self::Revoke => "revoke",
        }
    }
}

/// Cheaply cloneable handle; clones share one store and one scheduler.
#[derive(Clone)]
pub struct CredentialService {
    inner: Arc<Inner>,
}

struct Inner {
    store: CredentialStore,
    scheduler: Arc<dyn ExpiryScheduler>,
    generator: TokenGenerator,
    clock: Arc<dyn Clock>,
    metrics: KeyMetrics,
}

impl CredentialService {
    /// Wall clock and tokio timers. Must be called inside a tokio runtime.
    pub fn new(generator: TokenGenerator) -> Self {
        Self::with_clock(generator, Arc::new(SystemClock))
    }

    /// Tokio timers driven by `clock`. Must be called inside a tokio runtime.
    pub fn with_clock(generator: TokenGenerator, clock: Arc<dyn Clock>) -> Self {
        let scheduler = Arc::new(TokioScheduler::new(Arc::clone(&clock)));
        Self::with_parts(generator, clock, scheduler)
    }

    pub fn with_parts(
        generator: TokenGenerator,
        clock: Arc<dyn Clock>,
        scheduler: Arc<dyn ExpiryScheduler>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                store: CredentialStore::new(),
                scheduler,
                generator,
                clock,
                metrics: KeyMetrics::new(),
            }),
        }
    }

    /// Parses `duration` and issues a key. Unknown durations fail before any
    /// state is touched.
    pub fn issue_for(
        &self,
        duration: &str,
        description: Option<String>,
    ) -> Result<IssuedKey, KeyError> {
        let duration = duration.parse::<KeyDuration>().map_err(|e| {
            tracing::debug!(duration, "rejected key request with unknown duration");
            e
        })?;
        self.issue(duration, description)
    }

    pub fn issue(
        &self,
        duration: KeyDuration,
        description: Option<String>,
    ) -> Result<IssuedKey, KeyError> {
        let inner = &self.inner;
        let now = inner.clock.now();
        let expires_at = now + duration.ttl();

        let token = inner.generator.generate()?;
        let digest = KeyDigest::of(&token);
        let record = CredentialRecord::new(digest.clone(), description, now, expires_at);

        let on_expire = Inner::expiry_callback(&self.inner, digest.clone(), expires_at);

        inner.store.put_with(digest.clone(), record, || {
            inner.scheduler.arm(digest.clone(), expires_at, on_expire);
        })?;

        inner.metrics.record_issued(duration);
        tracing::info!(
            key = %digest.short(),
            duration = %duration,
            expires_at = %expires_at,
            "api key issued"
        );

        Ok(IssuedKey {
            token,
            expires_at,
            expires_in: remaining_secs(now, expires_at),
            message: ISSUED_MESSAGE.to_string(),
        })
    }

    /// Never fails: unknown, revoked and expired keys all come back as
    /// `valid: false` with no expiry fields.
    pub fn validate(&self, raw_key: &str) -> KeyValidation {
        let inner = &self.inner;
        let digest = KeyDigest::of(raw_key);
        let now = inner.clock.now();

        let (outcome, result) = match inner.store.get(&digest) {
            Some(record) if record.active && !record.is_expired_at(now) => (
                "valid",
                KeyValidation::valid(record.expires_at, remaining_secs(now, record.expires_at)),
            ),
            Some(record) if record.active => {
                inner.evict(&digest, Eviction::Lazy);
                ("expired", KeyValidation::invalid())
            }
            _ => ("unknown", KeyValidation::invalid()),
        };

        inner.metrics.record_validation(outcome);
        tracing::debug!(key = %digest.short(), outcome, "api key validated");
        result
    }

    /// Removes the key immediately. Returns whether a record was removed,
    /// which includes an expired record not yet reclaimed.
    pub fn revoke(&self, raw_key: &str) -> bool {
        self.inner.evict(&KeyDigest::of(raw_key), Eviction::Revoke)
    }

    pub fn active_keys(&self) -> usize {
        self.inner.store.len()
    }

    pub fn pending_timers(&self) -> usize {
        self.inner.scheduler.pending()
    }

    pub fn prefix(&self) -> &str {
        self.inner.generator.prefix()
    }

    pub fn metrics(&self) -> &KeyMetrics {
        &self.inner.metrics
    }

    pub fn render_metrics(&self) -> anyhow::Result<String> {
        self.inner
            .metrics
            .render(self.active_keys(), self.pending_timers())
    }
}

impl Inner {
    /// Timer callback. Holds only a weak handle so pending timers do not keep
    /// the service alive.
    fn expiry_callback(
        inner: &Arc<Inner>,
        digest: KeyDigest,
        expires_at: DateTime<Utc>,
    ) -> ExpireCallback {
        let weak = Arc::downgrade(inner);
        Box::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.on_timer(&digest, expires_at);
            }
        })
    }

    /// The timer runs on tokio time, which can drift from the injected clock.
    /// Only the clock decides expiry: an early wake-up re-arms for the rest.
    fn on_timer(self: &Arc<Self>, digest: &KeyDigest, expires_at: DateTime<Utc>) {
        let now = self.clock.now();
        if now >= expires_at {
            self.evict(digest, Eviction::Timer);
            return;
        }

        let rearmed = self.store.if_present_with(digest, || {
            let on_expire = Inner::expiry_callback(self, digest.clone(), expires_at);
            self.scheduler.arm(digest.clone(), expires_at, on_expire);
        });
        if rearmed {
            tracing::debug!(
                key = %digest.short(),
                remaining_secs = remaining_secs(now, expires_at),
                "expiry timer fired early, re-armed"
            );
        }
    }

    fn evict(&self, digest: &KeyDigest, path: Eviction) -> bool {
        let removed = self
            .store
            .delete_with(digest, || self.scheduler.cancel(digest))
            .is_some();

        if removed {
            self.metrics.record_eviction(path.as_str());
            tracing::debug!(key = %digest.short(), path = path.as_str(), "api key removed");
        }
        removed
    }
}
