//! TTL index for active expiration
//!
//! Maps deadline → keys with a BTreeMap so the expire cycle only visits keys
//! whose deadline has passed:
//! - `find_expired(now)` is O(expired count), not O(keyspace)
//! - one index per logical database, keyed by raw key bytes

use std::collections::BTreeMap;

use rustc_hash::FxHashSet;

/// TTL index: deadline (ms) → keys expiring at that instant
#[derive(Debug, Default)]
pub struct TtlIndex {
    index: BTreeMap<i64, FxHashSet<Vec<u8>>>,
}

impl TtlIndex {
    /// Create a new empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Track `key` as expiring at `deadline`
    pub fn insert(&mut self, deadline: i64, key: Vec<u8>) {
        self.index.entry(deadline).or_default().insert(key);
    }

    /// Stop tracking `key` at `deadline`
    ///
    /// Drops the deadline bucket once it becomes empty.
    pub fn remove(&mut self, deadline: i64, key: &[u8]) {
        if let Some(keys) = self.index.get_mut(&deadline) {
            keys.remove(key);
            if keys.is_empty() {
                self.index.remove(&deadline);
            }
        }
    }

    /// All keys whose deadline is at or before `now`
    pub fn find_expired(&self, now: i64) -> Vec<Vec<u8>> {
        self.index
            .range(..=now)
            .flat_map(|(_, keys)| keys.iter().cloned())
            .collect()
    }

    /// Forget every tracked key
    pub fn clear(&mut self) {
        self.index.clear();
    }
}
