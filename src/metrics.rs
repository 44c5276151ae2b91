//! Prometheus metrics for the key engine.
//!
//! Each recorder owns its own [`Registry`] so independent services (and
//! tests) never collide on metric names. `/metrics` renders it in the text
//! exposition format.

use prometheus::{opts, Encoder, IntCounterVec, IntGauge, Registry, TextEncoder};

use crate::keys::KeyDuration;

pub struct KeyMetrics {
    registry: Registry,

    // Counters
    issued_total: IntCounterVec,
    validations_total: IntCounterVec,
    evictions_total: IntCounterVec,

    // Gauges, refreshed at scrape time
    active_keys: IntGauge,
    pending_timers: IntGauge,
}

impl KeyMetrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let issued_total = IntCounterVec::new(
            opts!("keygate_keys_issued_total", "Total API keys issued"),
            &["duration"],
        )
        .expect("valid keygate_keys_issued_total definition");

        let validations_total = IntCounterVec::new(
            opts!("keygate_validations_total", "Total key validations by outcome"),
            &["outcome"],
        )
        .expect("valid keygate_validations_total definition");

        let evictions_total = IntCounterVec::new(
            opts!("keygate_evictions_total", "Total keys removed, by removal path"),
            &["path"],
        )
        .expect("valid keygate_evictions_total definition");

        let active_keys = IntGauge::new("keygate_active_keys", "Keys currently stored")
            .expect("valid keygate_active_keys definition");

        let pending_timers = IntGauge::new("keygate_pending_timers", "Expiry timers outstanding")
            .expect("valid keygate_pending_timers definition");

        registry
            .register(Box::new(issued_total.clone()))
            .expect("failed to register keygate_keys_issued_total");
        registry
            .register(Box::new(validations_total.clone()))
            .expect("failed to register keygate_validations_total");
        registry
            .register(Box::new(evictions_total.clone()))
            .expect("failed to register keygate_evictions_total");
        registry
            .register(Box::new(active_keys.clone()))
            .expect("failed to register keygate_active_keys");
        registry
            .register(Box::new(pending_timers.clone()))
            .expect("failed to register keygate_pending_timers");

        Self {
            registry,
            issued_total,
            validations_total,
            evictions_total,
            active_keys,
            pending_timers,
        }
    }

    pub fn record_issued(&self, duration: KeyDuration) {
        self.issued_total
            .with_label_values(&[duration.as_str()])
            .inc();
    }

    pub fn record_validation(&self, outcome: &str) {
        self.validations_total.with_label_values(&[outcome]).inc();
    }

    pub fn record_eviction(&self, path: &str) {
        self.evictions_total.with_label_values(&[path]).inc();
    }

    pub fn issued(&self, duration: KeyDuration) -> u64 {
        self.issued_total
            .with_label_values(&[duration.as_str()])
            .get()
    }

    pub fn validations(&self, outcome: &str) -> u64 {
        self.validations_total.with_label_values(&[outcome]).get()
    }

    pub fn evictions(&self, path: &str) -> u64 {
        self.evictions_total.with_label_values(&[path]).get()
    }

    /// Render all metrics, refreshing the occupancy gauges first.
    pub fn render(&self, active_keys: usize, pending_timers: usize) -> anyhow::Result<String> {
        self.active_keys.set(active_keys as i64);
        self.pending_timers.set(pending_timers as i64);

        let mut buf = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buf)?;
        Ok(String::from_utf8(buf)?)
    }
}

impl Default for KeyMetrics {
    fn default() -> Self {
        Self::new()
    }
}
