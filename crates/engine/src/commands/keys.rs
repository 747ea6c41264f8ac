//! Generic key commands and expiry.

use ember_core::{Error, Frame, Result};

use super::{count, int_arg, BuiltinCtx};

/// DEL key [key ...]
pub(crate) fn del(ctx: &mut BuiltinCtx<'_>) -> Result<Frame> {
    let db = *ctx.db;
    let removed = ctx.argv[1..].iter().filter(|key| ctx.ks.remove(db, key)).count();
    Ok(count(removed))
}

/// EXISTS key [key ...]
pub(crate) fn exists(ctx: &mut BuiltinCtx<'_>) -> Result<Frame> {
    let db = *ctx.db;
    let found = ctx.argv[1..].iter().filter(|key| ctx.ks.contains(db, key)).count();
    Ok(count(found))
}

/// TYPE key
pub(crate) fn key_type(ctx: &mut BuiltinCtx<'_>) -> Result<Frame> {
    let kind = ctx.ks.key_type(*ctx.db, &ctx.argv[1]);
    Ok(Frame::Simple(kind.as_str().to_string()))
}

/// PEXPIRE key milliseconds
pub(crate) fn pexpire(ctx: &mut BuiltinCtx<'_>) -> Result<Frame> {
    let millis = int_arg(&ctx.argv[2])?;
    let deadline = ctx
        .ks
        .now_millis()
        .checked_add(millis)
        .ok_or_else(|| Error::invalid_value("invalid expire time in 'pexpire' command"))?;
    let applied = ctx.ks.set_deadline(*ctx.db, &ctx.argv[1], Some(deadline));
    Ok(Frame::Integer(applied as i64))
}

/// PTTL key: -2 when missing, -1 without a deadline
pub(crate) fn pttl(ctx: &mut BuiltinCtx<'_>) -> Result<Frame> {
    let db = *ctx.db;
    let key = &ctx.argv[1];
    if !ctx.ks.contains(db, key) {
        return Ok(Frame::Integer(-2));
    }
    let ttl = match ctx.ks.deadline(db, key) {
        Some(at) => (at - ctx.ks.now_millis()).max(0),
        None => -1,
    };
    Ok(Frame::Integer(ttl))
}

/// PERSIST key
pub(crate) fn persist(ctx: &mut BuiltinCtx<'_>) -> Result<Frame> {
    let db = *ctx.db;
    let key = &ctx.argv[1];
    if ctx.ks.deadline(db, key).is_none() {
        return Ok(Frame::Integer(0));
    }
    ctx.ks.set_deadline(db, key, None);
    Ok(Frame::Integer(1))
}
