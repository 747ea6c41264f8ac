//! Command dispatch.
//!
//! [`execute`] runs one command line to completion: a built-in runs under
//! the keyspace lock, a module command runs with no lock held so its
//! handler can open keys and re-enter dispatch through `Call`.

use std::sync::Arc;

use ember_core::{CommandFn, Context, Frame, ModuleString};
use tracing::{debug, warn};

use crate::capabilities::get_api;
use crate::commands::{wrong_arity, Builtin, BuiltinCtx};
use crate::engine::Shared;
use crate::invocation::{HostFrame, Invocation};
use crate::propagate::Propagated;
use crate::registry::CommandEntry;

/// Outcome of one command.
#[derive(Debug)]
pub(crate) struct Executed {
    /// Encoded reply
    pub reply: Vec<u8>,
    /// What the command propagates if it ran at top level
    pub propagation: Vec<Propagated>,
    /// Whether the dataset changed
    pub dirty: bool,
}

impl Executed {
    fn error(message: &str) -> Self {
        Executed {
            reply: Frame::Error(message.to_string()).encode(),
            propagation: Vec::new(),
            dirty: false,
        }
    }
}

/// Run `argv` against database `db`. A `SELECT` updates `db`.
pub(crate) fn execute(shared: &Arc<Shared>, db: &mut usize, argv: Vec<Vec<u8>>) -> Executed {
    let Some(name) = argv.first() else {
        return Executed::error("ERR empty command");
    };
    let entry = shared.registry.read().lookup(name);
    match entry {
        None => Executed::error(&format!(
            "ERR unknown command '{}'",
            String::from_utf8_lossy(name)
        )),
        Some(CommandEntry::Builtin(builtin)) => run_builtin(shared, db, builtin, argv),
        Some(CommandEntry::Module { module, handler }) => {
            run_module(shared, db, &module, handler, argv)
        }
    }
}

fn run_builtin(shared: &Shared, db: &mut usize, builtin: &Builtin, argv: Vec<Vec<u8>>) -> Executed {
    if !builtin.arity_ok(argv.len()) {
        return Executed {
            reply: wrong_arity(builtin.name).encode(),
            propagation: Vec::new(),
            dirty: false,
        };
    }
    let mut ks = shared.keyspace.lock();
    let before = ks.dirty();
    let result = (builtin.handler)(&mut BuiltinCtx {
        ks: &mut *ks,
        db: &mut *db,
        argv: &argv,
    });
    let dirty = ks.dirty() != before;
    drop(ks);

    let frame = result.unwrap_or_else(|e| Frame::Error(e.reply_message()));
    let propagation = if builtin.write && dirty {
        vec![Propagated::new(*db, argv)]
    } else {
        Vec::new()
    };
    Executed {
        reply: frame.encode(),
        propagation,
        dirty,
    }
}

fn run_module(
    shared: &Arc<Shared>,
    db: &mut usize,
    module: &str,
    handler: CommandFn,
    argv: Vec<Vec<u8>>,
) -> Executed {
    let command = String::from_utf8_lossy(&argv[0]).to_ascii_lowercase();
    debug!(target: "ember::dispatch", module, command = %command, argc = argv.len(), "invoking module command");

    let args: Vec<ModuleString> = argv.iter().map(|arg| ModuleString::from(arg.as_slice())).collect();
    let before = shared.keyspace.lock().dirty();
    let invocation = Invocation::new(shared.clone(), command, *db, argv);
    let mut ctx = Context::new(get_api, Box::new(HostFrame::Invocation(Box::new(invocation))));

    let status = handler(&mut ctx, &args);

    let invocation = match ctx.into_host_state().downcast::<HostFrame>().map(|frame| *frame) {
        Ok(HostFrame::Invocation(invocation)) => invocation,
        _ => unreachable!("module context lost its invocation frame"),
    };
    let finished = invocation.finish();
    if !status.is_ok() && finished.report.missing_reply {
        warn!(target: "ember::dispatch", module, command = %finished.report.command, "handler failed without replying");
    }
    let dirty = shared.keyspace.lock().dirty() != before;
    *db = finished.db;
    *shared.last_report.lock() = Some(finished.report);

    Executed {
        reply: finished.reply,
        propagation: finished.propagation,
        dirty,
    }
}
