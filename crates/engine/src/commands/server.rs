//! Connection and database level commands.

use ember_core::{Frame, Result};

use super::{count, int_arg, ok, wrong_arity, BuiltinCtx};

/// PING [message]
pub(crate) fn ping(ctx: &mut BuiltinCtx<'_>) -> Result<Frame> {
    match ctx.argv {
        [_] => Ok(Frame::Simple("PONG".to_string())),
        [_, message] => Ok(Frame::bulk(message.clone())),
        _ => Ok(wrong_arity("ping")),
    }
}

/// ECHO message
pub(crate) fn echo(ctx: &mut BuiltinCtx<'_>) -> Result<Frame> {
    Ok(Frame::bulk(ctx.argv[1].clone()))
}

/// SELECT index
pub(crate) fn select(ctx: &mut BuiltinCtx<'_>) -> Result<Frame> {
    let index = int_arg(&ctx.argv[1])?;
    *ctx.db = ctx.ks.check_db(index)?;
    Ok(ok())
}

/// DBSIZE
pub(crate) fn dbsize(ctx: &mut BuiltinCtx<'_>) -> Result<Frame> {
    Ok(count(ctx.ks.len(*ctx.db)))
}

/// FLUSHDB
pub(crate) fn flushdb(ctx: &mut BuiltinCtx<'_>) -> Result<Frame> {
    ctx.ks.flush(*ctx.db);
    Ok(ok())
}
