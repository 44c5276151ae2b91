//! Digest-keyed record table.
//!
//! The store knows nothing about time. Expiry is enforced by the scheduler and
//! by lazy checks during validation. Records live in a sharded [`DashMap`], so
//! operations on one digest only lock the shard that digest hashes to.
//!
//! The `*_with` variants run a hook while the shard is still locked. The
//! service uses them to arm or cancel a timer in the same critical section as
//! the insert or delete, so no reader sees a record without its timer or a
//! timer without its record.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use super::{CredentialRecord, KeyDigest, KeyError};

#[derive(Default)]
pub struct CredentialStore {
    records: DashMap<KeyDigest, CredentialRecord>,
}

impl CredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, digest: KeyDigest, record: CredentialRecord) -> Result<(), KeyError> {
        self.put_with(digest, record, || {})
    }

    /// Inserts `record` and runs `on_insert` before releasing the shard.
    ///
    /// A live record under the same digest is never overwritten.
    pub fn put_with(
        &self,
        digest: KeyDigest,
        record: CredentialRecord,
        on_insert: impl FnOnce(),
    ) -> Result<(), KeyError> {
        match self.records.entry(digest) {
            Entry::Occupied(existing) if existing.get().active => {
                tracing::error!(key = %existing.key().short(), "digest collision on active key");
                Err(KeyError::DigestCollision)
            }
            Entry::Occupied(mut existing) => {
                existing.insert(record);
                on_insert();
                Ok(())
            }
            Entry::Vacant(slot) => {
                let _guard = slot.insert(record);
                on_insert();
                Ok(())
            }
        }
    }

    pub fn get(&self, digest: &KeyDigest) -> Option<CredentialRecord> {
        self.records.get(digest).map(|r| r.value().clone())
    }

    /// Idempotent: deleting an absent digest is a no-op.
    pub fn delete(&self, digest: &KeyDigest) -> Option<CredentialRecord> {
        self.delete_with(digest, || {})
    }

    /// Deactivates and removes the record, running `on_remove` in between
    /// with the shard still locked. `on_remove` is skipped when nothing is
    /// stored under `digest`.
    pub fn delete_with(
        &self,
        digest: &KeyDigest,
        on_remove: impl FnOnce(),
    ) -> Option<CredentialRecord> {
        match self.records.entry(digest.clone()) {
            Entry::Occupied(mut existing) => {
                existing.get_mut().active = false;
                on_remove();
                Some(existing.remove())
            }
            Entry::Vacant(_) => None,
        }
    }

    /// Runs `on_present` with the shard locked, only if `digest` is stored.
    /// Returns whether it ran.
    pub fn if_present_with(&self, digest: &KeyDigest, on_present: impl FnOnce()) -> bool {
        match self.records.get_mut(digest) {
            Some(_guard) => {
                on_present();
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use std::cell::Cell;

    fn record(raw: &str) -> (KeyDigest, CredentialRecord) {
        let digest = KeyDigest::of(raw);
        let now = Utc::now();
        let rec = CredentialRecord::new(digest.clone(), Some("test".into()), now, now + Duration::hours(1));
        (digest, rec)
    }

    #[test]
    fn test_put_get_delete() {
        let store = CredentialStore::new();
        let (digest, rec) = record("bgw_one");

        store.put(digest.clone(), rec).unwrap();
        assert_eq!(store.len(), 1);

        let fetched = store.get(&digest).unwrap();
        assert!(fetched.active);
        assert_eq!(fetched.description.as_deref(), Some("test"));

        let removed = store.delete(&digest).unwrap();
        assert!(!removed.active, "removed records come back deactivated");
        assert!(store.get(&digest).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_delete_is_idempotent() {
        let store = CredentialStore::new();
        let (digest, rec) = record("bgw_two");
        store.put(digest.clone(), rec).unwrap();

        assert!(store.delete(&digest).is_some());
        assert!(store.delete(&digest).is_none());
        assert!(store.delete(&KeyDigest::of("never-stored")).is_none());
    }

    #[test]
    fn test_put_refuses_to_overwrite_active_record() {
        let store = CredentialStore::new();
        let (digest, rec) = record("bgw_dup");
        store.put(digest.clone(), rec.clone()).unwrap();

        let hook_ran = Cell::new(false);
        let err = store
            .put_with(digest.clone(), rec, || hook_ran.set(true))
            .unwrap_err();
        assert!(matches!(err, KeyError::DigestCollision));
        assert!(!hook_ran.get(), "hook must not run on collision");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_hooks_run_once_and_only_when_applicable() {
        let store = CredentialStore::new();
        let (digest, rec) = record("bgw_hooks");

        let inserts = Cell::new(0);
        store
            .put_with(digest.clone(), rec, || inserts.set(inserts.get() + 1))
            .unwrap();
        assert_eq!(inserts.get(), 1);

        let removes = Cell::new(0);
        store.delete_with(&digest, || removes.set(removes.get() + 1));
        store.delete_with(&digest, || removes.set(removes.get() + 1));
        assert_eq!(removes.get(), 1);
    }

    #[test]
    fn test_if_present_with_skips_absent_digest() {
        let store = CredentialStore::new();
        let (digest, rec) = record("bgw_present");

        let runs = Cell::new(0);
        assert!(!store.if_present_with(&digest, || runs.set(runs.get() + 1)));

        store.put(digest.clone(), rec).unwrap();
        assert!(store.if_present_with(&digest, || runs.set(runs.get() + 1)));
        assert_eq!(runs.get(), 1);
    }
}
