//! Store implementation.
//!
//! Both tables use `parking_lot::RwLock<HashMap<..>>`: many concurrent
//! readers, one writer. Nothing here expires or evicts; the tables grow
//! for the lifetime of the process.

use bytes::Bytes;
use parking_lot::RwLock;
use std::collections::HashMap;

type HashBucket = HashMap<Bytes, Bytes>;

/// Point-in-time copy of the string table.
pub type StringSnapshot = HashMap<Bytes, Bytes>;

/// Point-in-time copy of the hash table.
pub type HashSnapshot = HashMap<Bytes, HashMap<Bytes, Bytes>>;

/// The in-memory key-value store.
///
/// Owned by the server and shared with the command executor through an
/// `Arc`; there is no process-wide state.
#[derive(Debug, Default)]
pub struct Store {
    strings: RwLock<HashMap<Bytes, Bytes>>,
    hashes: RwLock<HashMap<Bytes, HashBucket>>,
}

impl Store {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    // ── String table ────────────────────────────────────────────────────

    /// Get a string value.
    pub fn get(&self, key: &[u8]) -> Option<Bytes> {
        self.strings.read().get(key).cloned()
    }

    /// Insert or overwrite a string value.
    pub fn set(&self, key: Bytes, value: Bytes) {
        self.strings.write().insert(key, value);
    }

    /// Remove a string key. Returns true if it existed.
    pub fn delete(&self, key: &[u8]) -> bool {
        self.strings.write().remove(key).is_some()
    }

    /// Number of keys in the string table.
    pub fn string_count(&self) -> usize {
        self.strings.read().len()
    }

    // ── Hash table ──────────────────────────────────────────────────────

    /// Set a field in a hash, creating the hash if it does not exist.
    ///
    /// Bucket creation and the field write happen under one write lock,
    /// so two writers racing on a new hash name both land in the same
    /// bucket. Returns true if the field is new.
    pub fn hset(&self, name: Bytes, field: Bytes, value: Bytes) -> bool {
        let mut hashes = self.hashes.write();
        hashes.entry(name).or_default().insert(field, value).is_none()
    }

    /// Get a field from a hash.
    pub fn hget(&self, name: &[u8], field: &[u8]) -> Option<Bytes> {
        self.hashes
            .read()
            .get(name)
            .and_then(|bucket| bucket.get(field))
            .cloned()
    }

    /// All field/value pairs of a hash, or `None` if the hash does not exist.
    pub fn hgetall(&self, name: &[u8]) -> Option<Vec<(Bytes, Bytes)>> {
        self.hashes.read().get(name).map(|bucket| {
            bucket
                .iter()
                .map(|(f, v)| (f.clone(), v.clone()))
                .collect()
        })
    }

    /// Number of hashes in the hash table.
    pub fn hash_count(&self) -> usize {
        self.hashes.read().len()
    }

    // ── Introspection ───────────────────────────────────────────────────

    /// Copy of the string table.
    pub fn strings_snapshot(&self) -> StringSnapshot {
        self.strings.read().clone()
    }

    /// Copy of the hash table.
    pub fn hashes_snapshot(&self) -> HashSnapshot {
        self.hashes.read().clone()
    }
}
