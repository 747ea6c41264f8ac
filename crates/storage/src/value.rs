//! Typed values stored under a key.

use std::collections::VecDeque;

use ember_core::KeyType;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::zset::SortedSet;

/// A value held in the keyspace.
///
/// Aggregates never stay empty: the keyspace deletes a list, hash, set or
/// sorted set as soon as its last element is removed.
#[derive(Debug, Clone)]
pub enum StoredValue {
    /// Binary-safe string
    String(Vec<u8>),
    /// List of strings
    List(VecDeque<Vec<u8>>),
    /// Field/value map
    Hash(FxHashMap<Vec<u8>, Vec<u8>>),
    /// Set of members
    Set(FxHashSet<Vec<u8>>),
    /// Members ordered by score
    ZSet(SortedSet),
}

impl StoredValue {
    /// Type reported for this value.
    pub fn key_type(&self) -> KeyType {
        match self {
            StoredValue::String(_) => KeyType::String,
            StoredValue::List(_) => KeyType::List,
            StoredValue::Hash(_) => KeyType::Hash,
            StoredValue::Set(_) => KeyType::Set,
            StoredValue::ZSet(_) => KeyType::ZSet,
        }
    }

    /// Byte length of a string, element count of an aggregate.
    pub fn len(&self) -> usize {
        match self {
            StoredValue::String(s) => s.len(),
            StoredValue::List(l) => l.len(),
            StoredValue::Hash(h) => h.len(),
            StoredValue::Set(s) => s.len(),
            StoredValue::ZSet(z) => z.len(),
        }
    }

    /// True for an aggregate with no elements left. Empty strings are values.
    pub fn is_empty_aggregate(&self) -> bool {
        !matches!(self, StoredValue::String(_)) && self.len() == 0
    }

    /// Fresh empty value of the given type, or `None` for `KeyType::Empty`.
    pub fn empty_of(kind: KeyType) -> Option<Self> {
        match kind {
            KeyType::Empty => None,
            KeyType::String => Some(StoredValue::String(Vec::new())),
            KeyType::List => Some(StoredValue::List(VecDeque::new())),
            KeyType::Hash => Some(StoredValue::Hash(FxHashMap::default())),
            KeyType::Set => Some(StoredValue::Set(FxHashSet::default())),
            KeyType::ZSet => Some(StoredValue::ZSet(SortedSet::new())),
        }
    }
}
