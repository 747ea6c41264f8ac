//! Per-invocation host state.
//!
//! Every time the host hands control to module code it boxes one
//! [`HostFrame`] into the [`Context`]: a load frame while `on_load` runs, an
//! invocation frame while a command handler runs. Capabilities downcast the
//! frame to find the state they act on and fail with `NotLoading` or
//! `NotInvocation` when called in the wrong phase.
//!
//! # Ownership
//!
//! Keys and call replies live in generation-checked arenas owned by the
//! invocation. Under [`Ownership::Explicit`] the handler must release each
//! of them; whatever it leaves open is logged, counted in the
//! [`InvocationReport`] and released by the host. Under
//! [`Ownership::Scoped`] releasing is optional and double releases are
//! ignored. Either way nothing survives the invocation.

use std::rc::Rc;
use std::sync::Arc;

use ember_core::{CallReply, CommandFn, Context, Error, KeyHandle, OpenMode, ReplyHandle, Result};
use ember_storage::RangeCursor;
use tracing::warn;

use crate::arena::Arena;
use crate::engine::Shared;
use crate::propagate::{Propagated, Propagator};
use crate::registry::ModuleAttribs;
use crate::reply::ReplyBuffer;

/// Resource discipline of one invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Ownership {
    /// The handler releases every key and reply it obtains
    #[default]
    Explicit,
    /// The host releases everything when the handler returns
    Scoped,
}

/// Bookkeeping for one finished module invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationReport {
    /// Command name as registered, lowercased
    pub command: String,
    /// Ownership in effect when the handler returned
    pub ownership: Ownership,
    /// Keys still open under explicit ownership
    pub leaked_keys: usize,
    /// Root replies never freed under explicit ownership
    pub leaked_replies: usize,
    /// Releases of an already released handle under explicit ownership
    pub double_releases: usize,
    /// Replies dropped because one was already complete
    pub dropped_replies: usize,
    /// Handler returned without a complete reply
    pub missing_reply: bool,
    /// Entries this invocation propagated
    pub propagated: usize,
}

/// State boxed into the context while module code runs.
pub(crate) enum HostFrame {
    Load(LoadFrame),
    Invocation(Box<Invocation>),
}

/// State of a module's `on_load`.
pub(crate) struct LoadFrame {
    pub attribs: Option<ModuleAttribs>,
    /// Commands to register if the load succeeds
    pub staged: Vec<(String, CommandFn)>,
    /// First load-time call the host rejected
    pub failure: Option<Error>,
    pub shared: Arc<Shared>,
}

/// A key opened by the handler.
#[derive(Debug)]
pub(crate) struct OpenKey {
    pub name: Vec<u8>,
    pub db: usize,
    pub mode: OpenMode,
    pub cursor: Option<RangeCursor>,
}

/// A reply obtained from `Call`, or an element of one.
#[derive(Debug)]
pub(crate) struct ReplySlot {
    pub root: Rc<CallReply>,
    /// Element indexes leading from `root` to this reply
    pub path: Vec<usize>,
    /// Root reply handle for elements; `None` for roots
    pub owner: Option<ReplyHandle>,
}

impl ReplySlot {
    /// The reply this slot designates
    pub(crate) fn reply(&self) -> Option<&CallReply> {
        self.path
            .iter()
            .try_fold(self.root.as_ref(), |reply, &index| reply.element(index))
    }
}

/// State of one running module command.
pub(crate) struct Invocation {
    pub shared: Arc<Shared>,
    pub command: String,
    pub db: usize,
    /// The command exactly as issued, for verbatim propagation
    pub argv: Vec<Vec<u8>>,
    pub reply: ReplyBuffer,
    pub keys: Arena<KeyHandle, OpenKey>,
    pub replies: Arena<ReplyHandle, ReplySlot>,
    pub ownership: Ownership,
    pub propagator: Propagator,
    pub double_releases: usize,
}

/// What an invocation leaves behind once its handler returned.
pub(crate) struct Finished {
    pub reply: Vec<u8>,
    pub db: usize,
    pub propagation: Vec<Propagated>,
    pub report: InvocationReport,
}

impl Invocation {
    pub(crate) fn new(shared: Arc<Shared>, command: String, db: usize, argv: Vec<Vec<u8>>) -> Self {
        Invocation {
            shared,
            command,
            db,
            argv,
            reply: ReplyBuffer::new(),
            keys: Arena::new(),
            replies: Arena::new(),
            ownership: Ownership::Explicit,
            propagator: Propagator::new(),
            double_releases: 0,
        }
    }

    /// Count a double release, or swallow it under scoped ownership.
    pub(crate) fn on_release_error(&mut self, err: Error) -> Result<()> {
        match err {
            Error::DoubleRelease { .. } if self.ownership == Ownership::Scoped => Ok(()),
            Error::DoubleRelease { kind } => {
                self.double_releases += 1;
                warn!(target: "ember::dispatch", command = %self.command, kind, "handle released twice");
                Err(err)
            }
            other => Err(other),
        }
    }

    /// Release everything still held and settle the reply and propagation.
    pub(crate) fn finish(self) -> Finished {
        let (leaked_keys, leaked_replies) = match self.ownership {
            Ownership::Scoped => (0, 0),
            Ownership::Explicit => {
                let keys = self.keys.len();
                let replies = self.replies.values().filter(|slot| slot.owner.is_none()).count();
                if keys > 0 || replies > 0 {
                    warn!(
                        target: "ember::dispatch",
                        command = %self.command,
                        leaked_keys = keys,
                        leaked_replies = replies,
                        "handler returned without releasing resources"
                    );
                }
                (keys, replies)
            }
        };
        let missing_reply = !self.reply.is_complete();
        let dropped_replies = self.reply.dropped();
        let reply = self.reply.finish(&self.command);
        let propagation = self.propagator.finish(self.db, &self.argv);
        let report = InvocationReport {
            command: self.command,
            ownership: self.ownership,
            leaked_keys,
            leaked_replies,
            double_releases: self.double_releases,
            dropped_replies,
            missing_reply,
            propagated: propagation.len(),
        };
        Finished {
            reply,
            db: self.db,
            propagation,
            report,
        }
    }
}

/// Invocation state behind a context.
pub(crate) fn invocation(ctx: &mut Context) -> Result<&mut Invocation> {
    match ctx.host_state_mut().downcast_mut::<HostFrame>() {
        Some(HostFrame::Invocation(inv)) => Ok(&mut **inv),
        _ => Err(Error::NotInvocation),
    }
}

/// Shared view of the invocation state behind a context.
pub(crate) fn invocation_ref(ctx: &Context) -> Result<&Invocation> {
    match ctx.host_state().downcast_ref::<HostFrame>() {
        Some(HostFrame::Invocation(inv)) => Ok(&**inv),
        _ => Err(Error::NotInvocation),
    }
}

/// Load state behind a context.
pub(crate) fn loading(ctx: &mut Context) -> Result<&mut LoadFrame> {
    match ctx.host_state_mut().downcast_mut::<HostFrame>() {
        Some(HostFrame::Load(frame)) => Ok(frame),
        _ => Err(Error::NotLoading),
    }
}
