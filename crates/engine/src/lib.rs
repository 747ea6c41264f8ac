//! Host engine for ember
//!
//! This crate ties the lower layers together:
//! - Engine + Session: open/configure the engine, run client commands
//! - Built-in commands and the command registry
//! - Module loading and the per-invocation host context
//! - Host implementations of every module capability
//! - Replication: per-invocation propagation, stream, append-only log
//!
//! The engine is the only component that knows about:
//! - Which commands exist and who implements them
//! - The ownership discipline of a running module command
//! - What replicas and the append-only log receive

#![warn(missing_docs)]
#![warn(clippy::all)]

mod arena;
mod capabilities;
mod commands;
pub mod config;
mod dispatch;
mod engine;
mod invocation;
mod propagate;
mod registry;
mod replication;
mod reply;

pub use capabilities::get_api;
pub use ember_storage::{Clock, ManualClock, SystemClock};
pub use config::{EngineConfig, FsyncPolicy, CONFIG_FILE_NAME};
pub use engine::{Engine, Session};
pub use invocation::{InvocationReport, Ownership};
pub use propagate::Propagated;
pub use registry::{ModuleAttribs, ModuleInfo};
