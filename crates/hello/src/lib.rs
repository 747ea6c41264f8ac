//! `helloworld`: example module for Ember
//!
//! Each command exercises one corner of the module protocol:
//!
//! | Command | Exercises |
//! |---------|-----------|
//! | `hello.simple` | selected database |
//! | `hello.push.native` | key handles, list push |
//! | `hello.push.call` | nested call, integer reply |
//! | `hello.push.call2` | nested call, relayed reply |
//! | `hello.list.sum.len` | array replies and their elements |
//! | `hello.list.splice` | two key handles, explicit release |
//! | `hello.list.splice.auto` | the same under automatic release |
//! | `hello.rand.array` | streamed array reply |
//! | `hello.repl1` | replication envelope |
//! | `hello.repl2` | verbatim replication after in-place edits |
//! | `hello.toggle.case` | direct string access |
//! | `hello.more.expire` | expiry read and write |
//! | `hello.zsumrange` | sorted set range cursor |

#![warn(missing_docs)]
#![warn(clippy::all)]

mod list;
mod misc;
mod repl;
mod string;
mod zset;

use ember_core::{
    CommandFn, Context, KeyHandle, ModuleString, OpenMode, Result, Status, API_VERSION_1,
};
use ember_module::ModuleContext;
use tracing::{debug, warn};

/// Name this module registers under
pub const MODULE_NAME: &str = "helloworld";

const COMMANDS: &[(&str, CommandFn)] = &[
    ("hello.simple", misc::simple),
    ("hello.push.native", list::push_native),
    ("hello.push.call", list::push_call),
    ("hello.push.call2", list::push_call_relay),
    ("hello.list.sum.len", list::sum_len),
    ("hello.list.splice", list::splice),
    ("hello.list.splice.auto", list::splice_auto),
    ("hello.rand.array", misc::rand_array),
    ("hello.repl1", repl::repl1),
    ("hello.repl2", repl::repl2),
    ("hello.toggle.case", string::toggle_case),
    ("hello.more.expire", misc::more_expire),
    ("hello.zsumrange", zset::sum_range),
];

/// Module entry point.
pub fn on_load(ctx: &mut Context, args: &[ModuleString]) -> Status {
    if let Err(e) = ember_module::init(ctx, MODULE_NAME, 1, API_VERSION_1) {
        warn!(target: "ember::hello", error = %e, "binding failed");
        return Status::Err;
    }
    for (i, arg) in args.iter().enumerate() {
        debug!(target: "ember::hello", index = i, arg = %arg.to_string_lossy(), "load argument");
    }
    for (name, handler) in COMMANDS {
        if let Err(e) = ctx.create_command(name, *handler) {
            warn!(target: "ember::hello", command = name, error = %e, "registration failed");
            return Status::Err;
        }
    }
    Status::Ok
}

/// Open `name`, run `body` against the handle, and close it again whatever
/// `body` returned.
pub(crate) fn with_open_key<T>(
    ctx: &mut Context,
    name: &[u8],
    mode: OpenMode,
    body: impl FnOnce(&mut Context, KeyHandle) -> Result<T>,
) -> Result<T> {
    let key = ctx.open_key(name, mode)?;
    let out = body(ctx, key);
    ctx.close_key(key)?;
    out
}

/// Names of every command [`on_load`] registers.
pub fn command_names() -> impl Iterator<Item = &'static str> {
    COMMANDS.iter().map(|(name, _)| *name)
}
