//! List commands.

use ember_core::{Error, Frame, KeyType, ListEnd, Result};
use ember_storage::StoredValue;

use super::{count, int_arg, BuiltinCtx};

/// LPUSH key element [element ...]
pub(crate) fn lpush(ctx: &mut BuiltinCtx<'_>) -> Result<Frame> {
    push(ctx, ListEnd::Head)
}

/// RPUSH key element [element ...]
pub(crate) fn rpush(ctx: &mut BuiltinCtx<'_>) -> Result<Frame> {
    push(ctx, ListEnd::Tail)
}

/// LPOP key
pub(crate) fn lpop(ctx: &mut BuiltinCtx<'_>) -> Result<Frame> {
    pop(ctx, ListEnd::Head)
}

/// RPOP key
pub(crate) fn rpop(ctx: &mut BuiltinCtx<'_>) -> Result<Frame> {
    pop(ctx, ListEnd::Tail)
}

fn push(ctx: &mut BuiltinCtx<'_>, end: ListEnd) -> Result<Frame> {
    let len = match ctx.ks.get_or_create(*ctx.db, &ctx.argv[1], KeyType::List)? {
        StoredValue::List(list) => {
            for element in &ctx.argv[2..] {
                match end {
                    ListEnd::Head => list.push_front(element.clone()),
                    ListEnd::Tail => list.push_back(element.clone()),
                }
            }
            list.len()
        }
        _ => return Err(Error::WrongType),
    };
    ctx.ks.mark_dirty();
    Ok(count(len))
}

fn pop(ctx: &mut BuiltinCtx<'_>, end: ListEnd) -> Result<Frame> {
    let db = *ctx.db;
    let key = &ctx.argv[1];
    let popped = match ctx.ks.get_mut(db, key) {
        None => return Ok(Frame::Null),
        Some(StoredValue::List(list)) => match end {
            ListEnd::Head => list.pop_front(),
            ListEnd::Tail => list.pop_back(),
        },
        Some(_) => return Err(Error::WrongType),
    };
    ctx.ks.remove_if_empty(db, key);
    match popped {
        Some(element) => {
            ctx.ks.mark_dirty();
            Ok(Frame::Bulk(element))
        }
        None => Ok(Frame::Null),
    }
}

/// LLEN key
pub(crate) fn llen(ctx: &mut BuiltinCtx<'_>) -> Result<Frame> {
    match ctx.ks.get(*ctx.db, &ctx.argv[1]) {
        None => Ok(Frame::Integer(0)),
        Some(StoredValue::List(list)) => Ok(count(list.len())),
        Some(_) => Err(Error::WrongType),
    }
}

/// LRANGE key start stop
///
/// Negative indexes count from the tail; out of range bounds are clamped.
pub(crate) fn lrange(ctx: &mut BuiltinCtx<'_>) -> Result<Frame> {
    let start = int_arg(&ctx.argv[2])?;
    let stop = int_arg(&ctx.argv[3])?;
    let list = match ctx.ks.get(*ctx.db, &ctx.argv[1]) {
        None => return Ok(Frame::Array(Vec::new())),
        Some(StoredValue::List(list)) => list,
        Some(_) => return Err(Error::WrongType),
    };
    let len = list.len() as i64;
    let start = if start < 0 { (len + start).max(0) } else { start };
    let stop = if stop < 0 { len + stop } else { stop.min(len - 1) };
    if start > stop || start >= len {
        return Ok(Frame::Array(Vec::new()));
    }
    let items = list
        .iter()
        .skip(start as usize)
        .take((stop - start + 1) as usize)
        .map(|element| Frame::Bulk(element.clone()))
        .collect();
    Ok(Frame::Array(items))
}
