//! Per-key reclamation timers.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use super::{Clock, KeyDigest};

pub type ExpireCallback = Box<dyn FnOnce() + Send + 'static>;

/// Arms and cancels the reclamation action for each live key.
///
/// At most one timer is pending per digest. `cancel` is idempotent.
pub trait ExpiryScheduler: Send + Sync {
    /// Schedules `on_expire` for `expires_at`, replacing any timer already
    /// armed for `digest`. Instants in the past fire on the next tick.
    fn arm(&self, digest: KeyDigest, expires_at: DateTime<Utc>, on_expire: ExpireCallback);

    fn cancel(&self, digest: &KeyDigest);

    /// Number of timers still outstanding.
    fn pending(&self) -> usize;
}

struct Timer {
    id: u64,
    task: JoinHandle<()>,
}

/// One sleeping tokio task per key.
///
/// Delays are computed against the injected [`Clock`] when the timer is armed.
pub struct TokioScheduler {
    timers: Arc<DashMap<KeyDigest, Timer>>,
    next_id: AtomicU64,
    clock: Arc<dyn Clock>,
    runtime: Handle,
}

impl TokioScheduler {
    /// # Panics
    /// Panics when called outside a tokio runtime.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            timers: Arc::new(DashMap::new()),
            next_id: AtomicU64::new(0),
            clock,
            runtime: Handle::current(),
        }
    }
}

impl ExpiryScheduler for TokioScheduler {
    fn arm(&self, digest: KeyDigest, expires_at: DateTime<Utc>, on_expire: ExpireCallback) {
        let delay = (expires_at - self.clock.now())
            .to_std()
            .unwrap_or(Duration::ZERO);
        let deadline = Instant::now() + delay;
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);

        // Hold the slot while spawning so a zero-delay timer cannot fire
        // before its handle is recorded.
        let slot = self.timers.entry(digest.clone());

        let timers = Arc::clone(&self.timers);
        let task = self.runtime.spawn(async move {
            tokio::time::sleep_until(deadline).await;
            on_expire();
            timers.remove_if(&digest, |_, t| t.id == id);
        });

        match slot {
            Entry::Occupied(mut existing) => {
                let previous = existing.insert(Timer { id, task });
                previous.task.abort();
            }
            Entry::Vacant(empty) => {
                empty.insert(Timer { id, task });
            }
        }
    }

    fn cancel(&self, digest: &KeyDigest) {
        // Aborting from inside the timer's own callback is harmless: the task
        // has no await points left.
        if let Some((_, timer)) = self.timers.remove(digest) {
            timer.task.abort();
        }
    }

    fn pending(&self) -> usize {
        self.timers.len()
    }
}

impl Drop for TokioScheduler {
    fn drop(&mut self) {
        for timer in self.timers.iter() {
            timer.task.abort();
        }
    }
}
