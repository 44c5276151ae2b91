//! Time source shared by issuance math and expiry timers.
//!
//! Everything in the key engine reads "now" through a [`Clock`] so tests can
//! move time forward deterministically instead of sleeping.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

/// Source of the current instant.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually driven clock. Clones share the same instant.
///
/// Millisecond resolution, which matches the precision keys are reported with.
#[derive(Debug, Clone)]
pub struct ManualClock(Arc<AtomicI64>);

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self(Arc::new(AtomicI64::new(start.timestamp_millis())))
    }

    pub fn set(&self, at: DateTime<Utc>) {
        self.0.store(at.timestamp_millis(), Ordering::SeqCst);
    }

    pub fn advance(&self, by: Duration) {
        self.0.fetch_add(by.num_milliseconds(), Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        let millis = self.0.load(Ordering::SeqCst);
        DateTime::from_timestamp_millis(millis).unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    #[test]
    fn test_manual_clock_set_and_advance() {
        let clock = ManualClock::new(at("2024-01-01T00:00:00Z"));
        assert_eq!(clock.now(), at("2024-01-01T00:00:00Z"));

        clock.advance(Duration::minutes(30));
        assert_eq!(clock.now(), at("2024-01-01T00:30:00Z"));

        clock.set(at("2024-06-01T12:00:00Z"));
        assert_eq!(clock.now(), at("2024-06-01T12:00:00Z"));
    }

    #[test]
    fn test_manual_clock_clones_share_time() {
        let clock = ManualClock::new(at("2024-01-01T00:00:00Z"));
        let other = clock.clone();
        clock.advance(Duration::seconds(90));
        assert_eq!(other.now(), at("2024-01-01T00:01:30Z"));
    }
}
