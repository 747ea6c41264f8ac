//! Module SDK for Ember
//!
//! Everything a module needs to talk to the host:
//! - [`init`]: bind the capability table and declare the module
//! - [`ModuleContext`]: capabilities as methods on [`Context`]
//! - [`CallBuilder`]: nested calls without hand-written format strings
//! - [`reply_on_error`]: `Result`-based handler bodies
//!
//! # Usage
//!
//! ```ignore
//! use ember_module::prelude::*;
//!
//! pub fn on_load(ctx: &mut Context, _args: &[ModuleString]) -> Status {
//!     if ember_module::init(ctx, "counter", 1, API_VERSION_1).is_err() {
//!         return Status::Err;
//!     }
//!     ctx.create_command("counter.get", get).into()
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod binder;
mod call;
mod context;

pub use binder::{api, init, is_bound, CapabilityTable};
pub use call::CallBuilder;
pub use context::{reply_on_error, ModuleContext};

/// Glob-importable set of the types handlers use.
pub mod prelude {
    pub use crate::{reply_on_error, CallBuilder, ModuleContext};
    pub use ember_core::{
        CallArg, Context, Error, KeyHandle, KeyType, ListEnd, ModuleString, OpenMode, ReplyHandle,
        ReplyType, Result, Status, ZaddMode, ZaddOutcome, ZsetRange, API_VERSION_1, NO_EXPIRE,
        WRONGTYPE_MESSAGE,
    };
}
