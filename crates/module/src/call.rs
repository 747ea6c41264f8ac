//! Builder for nested calls and replicated commands.
//!
//! Assembles the format string and argument list in step, so the two can
//! never disagree:
//!
//! ```ignore
//! let reply = CallBuilder::new("RPUSH")
//!     .string(&argv[1])
//!     .buffer("item")
//!     .replicate_if_mutated()
//!     .invoke(ctx)?;
//! ```

use ember_core::{CallArg, Context, ModuleString, ReplyHandle, Result};

use crate::context::ModuleContext;

/// A command line under construction.
#[derive(Debug, Clone)]
pub struct CallBuilder<'a> {
    command: &'a str,
    format: String,
    args: Vec<CallArg>,
}

impl<'a> CallBuilder<'a> {
    /// Start a call to `command`.
    pub fn new(command: &'a str) -> Self {
        CallBuilder {
            command,
            format: String::new(),
            args: Vec::new(),
        }
    }

    /// Append a module string (`s`).
    pub fn string(mut self, s: &ModuleString) -> Self {
        self.format.push('s');
        self.args.push(CallArg::String(s.clone()));
        self
    }

    /// Append literal bytes (`c`).
    pub fn buffer(mut self, bytes: impl AsRef<[u8]>) -> Self {
        self.format.push('c');
        self.args.push(CallArg::Buffer(bytes.as_ref().to_vec()));
        self
    }

    /// Append an integer (`l`).
    pub fn integer(mut self, value: i64) -> Self {
        self.format.push('l');
        self.args.push(CallArg::Integer(value));
        self
    }

    /// Splice several module strings in place (`v`).
    pub fn vector(mut self, items: &[ModuleString]) -> Self {
        self.format.push('v');
        self.args.push(CallArg::Vector(items.to_vec()));
        self
    }

    /// Replicate the call if it modifies the dataset (`!`).
    pub fn replicate_if_mutated(mut self) -> Self {
        if !self.format.contains('!') {
            self.format.push('!');
        }
        self
    }

    /// The format string built so far.
    pub fn format(&self) -> &str {
        &self.format
    }

    /// The arguments built so far.
    pub fn args(&self) -> &[CallArg] {
        &self.args
    }

    /// Dispatch the call.
    pub fn invoke(self, ctx: &mut Context) -> Result<ReplyHandle> {
        ctx.call(self.command, &self.format, &self.args)
    }

    /// Queue the command line for replication without running it.
    pub fn replicate(self, ctx: &mut Context) -> Result<()> {
        ctx.replicate(self.command, &self.format, &self.args)
    }
}
