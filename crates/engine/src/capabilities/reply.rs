//! Reply capabilities.
//!
//! All of them write into the invocation's reply buffer and report
//! `Status::Err` when called outside an invocation, with an invalid reply
//! handle, or after the top-level reply is already complete.

use ember_core::{Context, ModuleString, ReplyHandle, Status};

use crate::invocation::invocation;
use crate::reply::ReplyBuffer;

fn write(ctx: &mut Context, reply: impl FnOnce(&mut ReplyBuffer) -> Status) -> Status {
    match invocation(ctx) {
        Ok(inv) => reply(&mut inv.reply),
        Err(_) => Status::Err,
    }
}

pub(super) fn wrong_arity(ctx: &mut Context) -> Status {
    match invocation(ctx) {
        Ok(inv) => {
            let message = format!("ERR wrong number of arguments for '{}' command", inv.command);
            inv.reply.error(&message)
        }
        Err(_) => Status::Err,
    }
}

pub(super) fn with_long_long(ctx: &mut Context, value: i64) -> Status {
    write(ctx, |reply| reply.integer(value))
}

pub(super) fn with_error(ctx: &mut Context, message: &str) -> Status {
    write(ctx, |reply| reply.error(message))
}

pub(super) fn with_simple_string(ctx: &mut Context, status: &str) -> Status {
    write(ctx, |reply| reply.simple(status))
}

pub(super) fn with_array(ctx: &mut Context, len: usize) -> Status {
    write(ctx, |reply| reply.array(len))
}

pub(super) fn with_string_buffer(ctx: &mut Context, bytes: &[u8]) -> Status {
    write(ctx, |reply| reply.bulk(bytes))
}

pub(super) fn with_string(ctx: &mut Context, value: &ModuleString) -> Status {
    write(ctx, |reply| reply.bulk(value.as_bytes()))
}

pub(super) fn with_null(ctx: &mut Context) -> Status {
    write(ctx, ReplyBuffer::null)
}

pub(super) fn with_double(ctx: &mut Context, value: f64) -> Status {
    write(ctx, |reply| reply.double(value))
}

/// Relay a call reply's bytes unchanged.
pub(super) fn with_call_reply(ctx: &mut Context, handle: ReplyHandle) -> Status {
    let Ok(inv) = invocation(ctx) else {
        return Status::Err;
    };
    match inv.replies.get(handle).ok().and_then(|slot| slot.reply()) {
        Some(call_reply) => inv.reply.raw(call_reply.proto()),
        None => Status::Err,
    }
}
