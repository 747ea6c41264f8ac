//! Call/reply bridge.
//!
//! `Call` re-enters dispatch with the caller's database and stores the
//! result as a root reply. Elements of an array reply get handles of their
//! own that point back into the root; they are released with it.

use std::rc::Rc;

use ember_core::{
    pack, CallArg, CallReply, Context, Error, ModuleString, ReplyHandle, ReplyType, Result,
};
use tracing::debug;

use crate::dispatch;
use crate::invocation::{invocation, invocation_ref, ReplySlot};
use crate::propagate::Propagated;

/// Call: run a command synchronously.
///
/// Fails only when the arguments do not match the format; errors raised
/// by the command itself come back as an error reply. With the `!` code
/// the command is queued for propagation if it changed the dataset.
pub(super) fn call(ctx: &mut Context, command: &str, format: &str, args: &[CallArg]) -> Result<ReplyHandle> {
    let packed = pack(command, format, args)?;
    let inv = invocation(ctx)?;
    let shared = inv.shared.clone();
    let mut db = inv.db;
    debug!(target: "ember::dispatch", caller = %inv.command, command, "nested call");

    let executed = dispatch::execute(&shared, &mut db, packed.argv.clone());

    if packed.replicate && executed.dirty {
        inv.propagator.push(Propagated::new(inv.db, packed.argv));
    }
    Ok(inv.replies.insert(ReplySlot {
        root: Rc::new(CallReply::from_proto(executed.reply)),
        path: Vec::new(),
        owner: None,
    }))
}

fn reply_of(ctx: &Context, handle: ReplyHandle) -> Result<&CallReply> {
    invocation_ref(ctx)?
        .replies
        .get(handle)?
        .reply()
        .ok_or(Error::InvalidHandle { kind: "reply" })
}

/// CallReplyProto
pub(super) fn proto(ctx: &Context, handle: ReplyHandle) -> Result<&[u8]> {
    Ok(reply_of(ctx, handle)?.proto())
}

/// FreeCallReply: freeing an element is a no-op, freeing a root also
/// releases every element handle taken from it.
pub(super) fn free(ctx: &mut Context, handle: ReplyHandle) -> Result<()> {
    let inv = invocation(ctx)?;
    if matches!(inv.replies.get(handle), Ok(slot) if slot.owner.is_some()) {
        return Ok(());
    }
    match inv.replies.remove(handle) {
        Ok(_) => {
            inv.replies.remove_where(|slot| slot.owner == Some(handle));
            Ok(())
        }
        Err(e) => inv.on_release_error(e),
    }
}

/// CallReplyType
pub(super) fn reply_type(ctx: &Context, handle: ReplyHandle) -> Result<ReplyType> {
    Ok(reply_of(ctx, handle)?.reply_type())
}

/// CallReplyInteger
pub(super) fn integer(ctx: &Context, handle: ReplyHandle) -> Result<i64> {
    Ok(reply_of(ctx, handle)?.integer())
}

/// CallReplyLength
pub(super) fn length(ctx: &Context, handle: ReplyHandle) -> Result<usize> {
    Ok(reply_of(ctx, handle)?.length())
}

/// CallReplyArrayElement: `None` for non-arrays and out of range indexes.
pub(super) fn array_element(
    ctx: &mut Context,
    handle: ReplyHandle,
    index: usize,
) -> Result<Option<ReplyHandle>> {
    let inv = invocation(ctx)?;
    let parent = inv.replies.get(handle)?;
    if parent.reply().and_then(|reply| reply.element(index)).is_none() {
        return Ok(None);
    }
    let mut path = parent.path.clone();
    path.push(index);
    let element = ReplySlot {
        root: Rc::clone(&parent.root),
        path,
        owner: Some(parent.owner.unwrap_or(handle)),
    };
    Ok(Some(inv.replies.insert(element)))
}

/// CallReplyStringPtr
pub(super) fn string_ptr(ctx: &Context, handle: ReplyHandle) -> Result<Option<&[u8]>> {
    Ok(reply_of(ctx, handle)?.string_bytes())
}

/// CreateStringFromCallReply
pub(super) fn create_string(ctx: &Context, handle: ReplyHandle) -> Result<Option<ModuleString>> {
    Ok(reply_of(ctx, handle)?.string_bytes().map(ModuleString::from))
}
