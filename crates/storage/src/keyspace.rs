//! Numbered logical databases with expiry
//!
//! The keyspace owns every stored value. Expired keys are removed lazily the
//! first time they are looked up, and in bulk by [`Keyspace::active_expire_cycle`]
//! using the per-database TTL index. Every removal caused by expiry is queued
//! so the engine can propagate it as a `DEL`.
//!
//! Database indexes passed to the methods below must be smaller than
//! [`Keyspace::db_count`]; callers validate user input with
//! [`Keyspace::check_db`].

use std::sync::Arc;

use ember_core::{Error, KeyType, Result};
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::clock::Clock;
use crate::ttl::TtlIndex;
use crate::value::StoredValue;

#[derive(Debug)]
struct Entry {
    value: StoredValue,
    expires_at: Option<i64>,
}

#[derive(Debug, Default)]
struct Database {
    entries: FxHashMap<Vec<u8>, Entry>,
    ttl: TtlIndex,
}

impl Database {
    fn remove(&mut self, key: &[u8]) -> Option<Entry> {
        let entry = self.entries.remove(key)?;
        if let Some(deadline) = entry.expires_at {
            self.ttl.remove(deadline, key);
        }
        Some(entry)
    }
}

/// A key removed because its deadline passed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpiredKey {
    /// Database the key lived in
    pub db: usize,
    /// Key bytes
    pub key: Vec<u8>,
}

/// All logical databases of one engine.
#[derive(Debug)]
pub struct Keyspace {
    dbs: Vec<Database>,
    clock: Arc<dyn Clock>,
    dirty: u64,
    expired: Vec<ExpiredKey>,
    expired_total: u64,
}

impl Keyspace {
    /// Create `databases` empty databases.
    pub fn new(databases: usize, clock: Arc<dyn Clock>) -> Self {
        Keyspace {
            dbs: (0..databases.max(1)).map(|_| Database::default()).collect(),
            clock,
            dirty: 0,
            expired: Vec::new(),
            expired_total: 0,
        }
    }

    /// Number of logical databases
    pub fn db_count(&self) -> usize {
        self.dbs.len()
    }

    /// Validate a user-supplied database index.
    pub fn check_db(&self, index: i64) -> Result<usize> {
        if index < 0 || index as usize >= self.dbs.len() {
            return Err(Error::NoSuchDb { index });
        }
        Ok(index as usize)
    }

    /// Current time according to the keyspace clock
    pub fn now_millis(&self) -> i64 {
        self.clock.now_millis()
    }

    /// Count of dataset changes since creation.
    ///
    /// Compare two readings to tell whether something in between wrote.
    pub fn dirty(&self) -> u64 {
        self.dirty
    }

    /// Record a change made through [`Keyspace::get_mut`] or
    /// [`Keyspace::get_or_create`].
    pub fn mark_dirty(&mut self) {
        self.dirty += 1;
    }

    /// Total keys removed by expiry
    pub fn expired_total(&self) -> u64 {
        self.expired_total
    }

    /// Take the keys removed by expiry since the last drain.
    pub fn drain_expired(&mut self) -> Vec<ExpiredKey> {
        std::mem::take(&mut self.expired)
    }

    // ---------------------------------------------------------------------
    // Lookup
    // ---------------------------------------------------------------------

    /// Value stored under `key`, if any and not expired.
    pub fn get(&mut self, db: usize, key: &[u8]) -> Option<&StoredValue> {
        self.expire_if_needed(db, key);
        self.dbs[db].entries.get(key).map(|e| &e.value)
    }

    /// Mutable value stored under `key`, if any and not expired.
    pub fn get_mut(&mut self, db: usize, key: &[u8]) -> Option<&mut StoredValue> {
        self.expire_if_needed(db, key);
        self.dbs[db].entries.get_mut(key).map(|e| &mut e.value)
    }

    /// Type of the value under `key`, `KeyType::Empty` when absent.
    pub fn key_type(&mut self, db: usize, key: &[u8]) -> KeyType {
        self.get(db, key).map_or(KeyType::Empty, StoredValue::key_type)
    }

    /// True if a live value exists under `key`
    pub fn contains(&mut self, db: usize, key: &[u8]) -> bool {
        self.get(db, key).is_some()
    }

    /// Value under `key`, creating an empty one of `kind` when absent.
    ///
    /// Fails with `WrongType` if the key holds another type. An aggregate
    /// created here and left empty must be cleaned up with
    /// [`Keyspace::remove_if_empty`].
    pub fn get_or_create(&mut self, db: usize, key: &[u8], kind: KeyType) -> Result<&mut StoredValue> {
        self.expire_if_needed(db, key);
        let database = &mut self.dbs[db];
        if !database.entries.contains_key(key) {
            let value = StoredValue::empty_of(kind)
                .ok_or_else(|| Error::invalid_value("cannot create a value of type none"))?;
            database.entries.insert(
                key.to_vec(),
                Entry {
                    value,
                    expires_at: None,
                },
            );
        }
        match database.entries.get_mut(key) {
            Some(entry) if entry.value.key_type() == kind => Ok(&mut entry.value),
            _ => Err(Error::WrongType),
        }
    }

    // ---------------------------------------------------------------------
    // Mutation
    // ---------------------------------------------------------------------

    /// Store `value` under `key`, replacing any value and deadline.
    pub fn set(&mut self, db: usize, key: &[u8], value: StoredValue) {
        let database = &mut self.dbs[db];
        database.remove(key);
        database.entries.insert(
            key.to_vec(),
            Entry {
                value,
                expires_at: None,
            },
        );
        self.dirty += 1;
    }

    /// Delete `key`; returns whether a live value was removed.
    pub fn remove(&mut self, db: usize, key: &[u8]) -> bool {
        self.expire_if_needed(db, key);
        let removed = self.dbs[db].remove(key).is_some();
        if removed {
            self.dirty += 1;
        }
        removed
    }

    /// Delete `key` if it holds an aggregate with no elements.
    pub fn remove_if_empty(&mut self, db: usize, key: &[u8]) {
        let database = &mut self.dbs[db];
        if database
            .entries
            .get(key)
            .map_or(false, |e| e.value.is_empty_aggregate())
        {
            database.remove(key);
        }
    }

    /// Remove every key of one database.
    pub fn flush(&mut self, db: usize) {
        let database = &mut self.dbs[db];
        self.dirty += database.entries.len() as u64;
        database.entries.clear();
        database.ttl.clear();
    }

    /// Number of keys in one database, including not yet collected expired ones.
    pub fn len(&self, db: usize) -> usize {
        self.dbs[db].entries.len()
    }

    /// True if one database holds no keys
    pub fn is_empty(&self, db: usize) -> bool {
        self.dbs[db].entries.is_empty()
    }

    // ---------------------------------------------------------------------
    // Expiry
    // ---------------------------------------------------------------------

    /// Absolute deadline of `key` in milliseconds.
    pub fn deadline(&mut self, db: usize, key: &[u8]) -> Option<i64> {
        self.expire_if_needed(db, key);
        self.dbs[db].entries.get(key).and_then(|e| e.expires_at)
    }

    /// Set or clear the absolute deadline of `key`.
    ///
    /// Returns false when the key does not exist. A deadline that already
    /// passed deletes the key immediately.
    pub fn set_deadline(&mut self, db: usize, key: &[u8], deadline: Option<i64>) -> bool {
        self.expire_if_needed(db, key);
        let now = self.clock.now_millis();
        let database = &mut self.dbs[db];
        let Some(entry) = database.entries.get_mut(key) else {
            return false;
        };
        let previous = std::mem::replace(&mut entry.expires_at, deadline);
        if let Some(old) = previous {
            database.ttl.remove(old, key);
        }
        match deadline {
            Some(at) if at <= now => {
                database.remove(key);
            }
            Some(at) => database.ttl.insert(at, key.to_vec()),
            None => {}
        }
        self.dirty += 1;
        true
    }

    /// Remove every key whose deadline passed. Returns the number removed.
    pub fn active_expire_cycle(&mut self) -> usize {
        let now = self.clock.now_millis();
        let mut removed = 0;
        for (db, database) in self.dbs.iter_mut().enumerate() {
            for key in database.ttl.find_expired(now) {
                database.remove(&key);
                debug!(target: "ember::expire", db, key = %String::from_utf8_lossy(&key), "active expire");
                self.expired.push(ExpiredKey { db, key });
                removed += 1;
            }
        }
        self.expired_total += removed as u64;
        removed
    }

    fn expire_if_needed(&mut self, db: usize, key: &[u8]) {
        let now = self.clock.now_millis();
        let database = &mut self.dbs[db];
        let expired = matches!(
            database.entries.get(key),
            Some(Entry { expires_at: Some(at), .. }) if *at <= now
        );
        if expired {
            database.remove(key);
            debug!(target: "ember::expire", db, key = %String::from_utf8_lossy(key), "lazy expire");
            self.expired.push(ExpiredKey {
                db,
                key: key.to_vec(),
            });
            self.expired_total += 1;
        }
    }
}
