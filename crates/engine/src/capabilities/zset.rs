//! Sorted set capabilities and the per-key range cursor.
//!
//! A key handle owns at most one cursor. `ZsetFirstInRange` replaces it,
//! `ZsetRangeStop` and `CloseKey` drop it. The cursor holds the last member
//! it returned, not a position, so it stays valid while the set changes and
//! always moves forward.

use ember_core::{
    Context, Error, KeyHandle, KeyType, ModuleString, Result, ZaddMode, ZaddOutcome, ZsetRange,
};
use ember_storage::{SortedSet, StoredValue};

use super::key::{with_key, Access};
use crate::invocation::invocation;

/// ZsetAdd
pub(super) fn add(
    ctx: &mut Context,
    key: KeyHandle,
    score: f64,
    member: &ModuleString,
    mode: ZaddMode,
) -> Result<ZaddOutcome> {
    with_key(ctx, key, Access::Write, |ks, db, name| {
        let result = match ks.get_or_create(db, name, KeyType::ZSet)? {
            StoredValue::ZSet(zset) => zset.add(member.as_bytes(), score, mode),
            _ => return Err(Error::WrongType),
        };
        ks.remove_if_empty(db, name);
        if matches!(result, Ok(ZaddOutcome::Added | ZaddOutcome::Updated)) {
            ks.mark_dirty();
        }
        result
    })
}

/// ZsetIncrby: returns the outcome and, unless the mode prevented it, the
/// new score.
pub(super) fn incrby(
    ctx: &mut Context,
    key: KeyHandle,
    delta: f64,
    member: &ModuleString,
    mode: ZaddMode,
) -> Result<(ZaddOutcome, Option<f64>)> {
    with_key(ctx, key, Access::Write, |ks, db, name| {
        let result = match ks.get_or_create(db, name, KeyType::ZSet)? {
            StoredValue::ZSet(zset) => zset.incr(member.as_bytes(), delta, mode),
            _ => return Err(Error::WrongType),
        };
        ks.remove_if_empty(db, name);
        if matches!(result, Ok((ZaddOutcome::Added | ZaddOutcome::Updated, _))) {
            ks.mark_dirty();
        }
        result
    })
}

/// ZsetScore: `None` for a missing member or an empty key.
pub(super) fn score(ctx: &mut Context, key: KeyHandle, member: &ModuleString) -> Result<Option<f64>> {
    with_key(ctx, key, Access::Read, |ks, db, name| match ks.get(db, name) {
        None => Ok(None),
        Some(StoredValue::ZSet(zset)) => Ok(zset.score(member.as_bytes())),
        Some(_) => Err(Error::WrongType),
    })
}

/// ZsetRem
pub(super) fn rem(ctx: &mut Context, key: KeyHandle, member: &ModuleString) -> Result<bool> {
    with_key(ctx, key, Access::Write, |ks, db, name| {
        let removed = match ks.get_mut(db, name) {
            None => false,
            Some(StoredValue::ZSet(zset)) => zset.remove(member.as_bytes()),
            Some(_) => return Err(Error::WrongType),
        };
        if removed {
            ks.remove_if_empty(db, name);
            ks.mark_dirty();
        }
        Ok(removed)
    })
}

/// ZsetFirstInRange: a key holding another type fails before any cursor
/// exists. An empty key yields a cursor already past the end.
pub(super) fn first_in_range(ctx: &mut Context, key: KeyHandle, range: &ZsetRange) -> Result<()> {
    let inv = invocation(ctx)?;
    let open = inv.keys.get_mut(key)?;
    let mut ks = inv.shared.keyspace.lock();
    let cursor = match ks.get(open.db, &open.name) {
        None => SortedSet::new().seek(range.clone()),
        Some(StoredValue::ZSet(zset)) => zset.seek(range.clone()),
        Some(_) => return Err(Error::WrongType),
    };
    open.cursor = Some(cursor);
    Ok(())
}

/// ZsetRangeCurrentElement
pub(super) fn current_element(ctx: &mut Context, key: KeyHandle) -> Result<(ModuleString, f64)> {
    let inv = invocation(ctx)?;
    let open = inv.keys.get(key)?;
    open.cursor
        .as_ref()
        .and_then(|cursor| cursor.current())
        .map(|(member, score)| (ModuleString::from(member), score))
        .ok_or(Error::CursorNotActive)
}

/// ZsetRangeNext: a key deleted or retyped under the cursor ends the range.
pub(super) fn next(ctx: &mut Context, key: KeyHandle) -> Result<bool> {
    let inv = invocation(ctx)?;
    let open = inv.keys.get_mut(key)?;
    let cursor = open.cursor.as_mut().ok_or(Error::CursorNotActive)?;
    let mut ks = inv.shared.keyspace.lock();
    Ok(match ks.get(open.db, &open.name) {
        Some(StoredValue::ZSet(zset)) => zset.advance(cursor),
        _ => SortedSet::new().advance(cursor),
    })
}

/// ZsetRangeEndReached: true when no cursor is active.
pub(super) fn end_reached(ctx: &mut Context, key: KeyHandle) -> Result<bool> {
    let inv = invocation(ctx)?;
    let open = inv.keys.get(key)?;
    Ok(open.cursor.as_ref().map_or(true, |cursor| cursor.end_reached()))
}

/// ZsetRangeStop
pub(super) fn stop(ctx: &mut Context, key: KeyHandle) -> Result<()> {
    let inv = invocation(ctx)?;
    inv.keys.get_mut(key)?.cursor = None;
    Ok(())
}
