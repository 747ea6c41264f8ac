//! Storage layer for ember
//!
//! This crate holds the engine's data:
//! - Keyspace: numbered logical databases of typed values
//! - StoredValue: string, list, hash, set and sorted set values
//! - SortedSet + RangeCursor: score/lex/rank traversal
//! - TtlIndex: deadline index driving active expiry
//! - Clock: time source, swappable in tests

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod clock;
pub mod keyspace;
pub mod ttl;
pub mod value;
pub mod zset;

pub use clock::{Clock, ManualClock, SystemClock};
pub use keyspace::{ExpiredKey, Keyspace};
pub use ttl::TtlIndex;
pub use value::StoredValue;
pub use zset::{RangeCursor, SortedSet};
