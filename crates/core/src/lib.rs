//! Core types for Ember's module protocol
//!
//! This crate is everything the host and a module must agree on:
//! - Context: bootstrap accessor plus opaque host state
//! - Capability: typed host entry points, resolved by name
//! - ModuleString: binary-safe strings handed to and from handlers
//! - KeyType, OpenMode, ListEnd, ZaddMode: key handle vocabulary
//! - ZsetRange: score, lex and rank ranges for sorted set cursors
//! - CallArg: positional arguments for nested calls
//! - CallReply, Frame: replies and their RESP encoding
//! - Error: error type hierarchy

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod call;
pub mod capability;
pub mod error;
pub mod range;
pub mod reply;
pub mod resp;
pub mod string;
pub mod types;

pub use call::{pack, CallArg, PackedCall};
pub use capability::{
    Capability, CommandFn, Context, GetApiFn, OnLoadFn, StringDma, CAPABILITY_NAMES,
};
pub use error::{Error, Result, WRONGTYPE_MESSAGE};
pub use range::{LexBound, ZsetRange};
pub use reply::{CallReply, ReplyType};
pub use resp::Frame;
pub use string::{format_f64, parse_f64, parse_i64, ModuleString};
pub use types::{
    KeyHandle, KeyType, ListEnd, OpenMode, ReplyHandle, Status, ZaddMode, ZaddOutcome,
    API_VERSION_1, NO_EXPIRE,
};
