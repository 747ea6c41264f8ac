//! Sorted set commands.

use ember_core::{format_f64, Error, Frame, KeyType, Result, ZaddMode, ZaddOutcome};
use ember_storage::StoredValue;

use super::{count, float_arg, wrong_arity, BuiltinCtx};

/// ZADD key [NX|XX] score member [score member ...]
///
/// Every score is validated before the set is touched. Replies with the
/// number of members added.
pub(crate) fn zadd(ctx: &mut BuiltinCtx<'_>) -> Result<Frame> {
    let mut mode = ZaddMode::Always;
    let mut rest = &ctx.argv[2..];
    while let Some(flag) = rest.first() {
        let next = match flag.to_ascii_uppercase().as_slice() {
            b"NX" => ZaddMode::Nx,
            b"XX" => ZaddMode::Xx,
            _ => break,
        };
        if mode != ZaddMode::Always && mode != next {
            return Err(Error::invalid_value(
                "XX and NX options at the same time are not compatible",
            ));
        }
        mode = next;
        rest = &rest[1..];
    }
    if rest.is_empty() || rest.len() % 2 != 0 {
        return Ok(wrong_arity("zadd"));
    }
    let pairs = rest
        .chunks_exact(2)
        .map(|pair| Ok((float_arg(&pair[0])?, pair[1].as_slice())))
        .collect::<Result<Vec<(f64, &[u8])>>>()?;

    let db = *ctx.db;
    let key = &ctx.argv[1];
    let mut added = 0;
    let mut changed = false;
    let outcome = match ctx.ks.get_or_create(db, key, KeyType::ZSet)? {
        StoredValue::ZSet(zset) => pairs.iter().try_for_each(|&(score, member)| {
            match zset.add(member, score, mode)? {
                ZaddOutcome::Added => {
                    added += 1;
                    changed = true;
                }
                ZaddOutcome::Updated => changed = true,
                ZaddOutcome::Nop => {}
            }
            Ok::<(), Error>(())
        }),
        _ => return Err(Error::WrongType),
    };
    ctx.ks.remove_if_empty(db, key);
    if changed {
        ctx.ks.mark_dirty();
    }
    outcome.map(|()| count(added))
}

/// ZSCORE key member
pub(crate) fn zscore(ctx: &mut BuiltinCtx<'_>) -> Result<Frame> {
    match ctx.ks.get(*ctx.db, &ctx.argv[1]) {
        None => Ok(Frame::Null),
        Some(StoredValue::ZSet(zset)) => Ok(zset
            .score(&ctx.argv[2])
            .map_or(Frame::Null, |score| Frame::bulk(format_f64(score)))),
        Some(_) => Err(Error::WrongType),
    }
}

/// ZCARD key
pub(crate) fn zcard(ctx: &mut BuiltinCtx<'_>) -> Result<Frame> {
    match ctx.ks.get(*ctx.db, &ctx.argv[1]) {
        None => Ok(Frame::Integer(0)),
        Some(StoredValue::ZSet(zset)) => Ok(count(zset.len())),
        Some(_) => Err(Error::WrongType),
    }
}

/// ZREM key member [member ...]
pub(crate) fn zrem(ctx: &mut BuiltinCtx<'_>) -> Result<Frame> {
    let db = *ctx.db;
    let key = &ctx.argv[1];
    let removed = match ctx.ks.get_mut(db, key) {
        None => return Ok(Frame::Integer(0)),
        Some(StoredValue::ZSet(zset)) => ctx.argv[2..]
            .iter()
            .filter(|member| zset.remove(member))
            .count(),
        Some(_) => return Err(Error::WrongType),
    };
    ctx.ks.remove_if_empty(db, key);
    if removed > 0 {
        ctx.ks.mark_dirty();
    }
    Ok(count(removed))
}
