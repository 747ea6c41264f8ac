//! String commands.

use ember_core::{parse_i64, Error, Frame, KeyType, Result};
use ember_storage::StoredValue;

use super::{count, int_arg, ok, BuiltinCtx};

/// GET key
pub(crate) fn get(ctx: &mut BuiltinCtx<'_>) -> Result<Frame> {
    match ctx.ks.get(*ctx.db, &ctx.argv[1]) {
        None => Ok(Frame::Null),
        Some(StoredValue::String(bytes)) => Ok(Frame::bulk(bytes.clone())),
        Some(_) => Err(Error::WrongType),
    }
}

/// SET key value
pub(crate) fn set(ctx: &mut BuiltinCtx<'_>) -> Result<Frame> {
    ctx.ks
        .set(*ctx.db, &ctx.argv[1], StoredValue::String(ctx.argv[2].clone()));
    Ok(ok())
}

/// INCR key
pub(crate) fn incr(ctx: &mut BuiltinCtx<'_>) -> Result<Frame> {
    incr_by(ctx, 1)
}

/// DECR key
pub(crate) fn decr(ctx: &mut BuiltinCtx<'_>) -> Result<Frame> {
    incr_by(ctx, -1)
}

/// INCRBY key increment
pub(crate) fn incrby(ctx: &mut BuiltinCtx<'_>) -> Result<Frame> {
    let delta = int_arg(&ctx.argv[2])?;
    incr_by(ctx, delta)
}

/// Add to an integer string in place, keeping its deadline.
fn incr_by(ctx: &mut BuiltinCtx<'_>, delta: i64) -> Result<Frame> {
    let db = *ctx.db;
    let key = &ctx.argv[1];
    let value = match ctx.ks.get_mut(db, key) {
        None => {
            ctx.ks.set(db, key, StoredValue::String(delta.to_string().into_bytes()));
            return Ok(Frame::Integer(delta));
        }
        Some(StoredValue::String(bytes)) => {
            let current = parse_i64(bytes)
                .ok_or_else(|| Error::invalid_value("value is not an integer or out of range"))?;
            let updated = current
                .checked_add(delta)
                .ok_or_else(|| Error::invalid_value("increment or decrement would overflow"))?;
            *bytes = updated.to_string().into_bytes();
            updated
        }
        Some(_) => return Err(Error::WrongType),
    };
    ctx.ks.mark_dirty();
    Ok(Frame::Integer(value))
}

/// APPEND key value
pub(crate) fn append(ctx: &mut BuiltinCtx<'_>) -> Result<Frame> {
    let len = match ctx.ks.get_or_create(*ctx.db, &ctx.argv[1], KeyType::String)? {
        StoredValue::String(bytes) => {
            bytes.extend_from_slice(&ctx.argv[2]);
            bytes.len()
        }
        _ => return Err(Error::WrongType),
    };
    ctx.ks.mark_dirty();
    Ok(count(len))
}

/// STRLEN key
pub(crate) fn strlen(ctx: &mut BuiltinCtx<'_>) -> Result<Frame> {
    match ctx.ks.get(*ctx.db, &ctx.argv[1]) {
        None => Ok(Frame::Integer(0)),
        Some(StoredValue::String(bytes)) => Ok(count(bytes.len())),
        Some(_) => Err(Error::WrongType),
    }
}
