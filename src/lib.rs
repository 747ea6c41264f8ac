//! Ember - in-memory key-value engine with a load-time module protocol
//!
//! Modules extend the engine with new commands. They never link against
//! the engine: at load time they receive a context whose bootstrap accessor
//! resolves typed capabilities by name, and they reach the host only
//! through those.
//!
//! # Quick Start
//!
//! ```ignore
//! use ember::Engine;
//!
//! let engine = Engine::ephemeral()?;
//! engine.load_module(ember_hello::on_load, &[])?;
//!
//! let mut session = engine.session();
//! session.execute(&["hello.push.native", "list", "a"]);
//! ```
//!
//! # Architecture
//!
//! - `ember-core`: types both sides of the boundary agree on
//! - `ember-storage`: keyspace, typed values, expiry
//! - `ember-engine`: dispatch, module loading, capabilities, replication
//! - `ember-module`: the module-side SDK
//!
//! Only the engine and the shared protocol types are re-exported here.

pub use ember_core as protocol;
pub use ember_engine::*;
