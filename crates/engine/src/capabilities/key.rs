//! Key handle capabilities: open/close, generic queries, lists, strings
//! and expiry.
//!
//! Every operation checks the stored type before it mutates anything, and
//! write operations require a handle opened with write access.

use ember_core::{
    Context, Error, KeyHandle, KeyType, ListEnd, ModuleString, OpenMode, Result, StringDma,
    NO_EXPIRE,
};
use ember_storage::{Keyspace, StoredValue};
use parking_lot::MutexGuard;

use crate::invocation::{invocation, OpenKey};

#[derive(Clone, Copy, PartialEq, Eq)]
pub(super) enum Access {
    Read,
    Write,
}

/// Run `op` against the key behind `key` with the keyspace locked.
pub(super) fn with_key<T>(
    ctx: &mut Context,
    key: KeyHandle,
    access: Access,
    op: impl FnOnce(&mut Keyspace, usize, &[u8]) -> Result<T>,
) -> Result<T> {
    let inv = invocation(ctx)?;
    let open = inv.keys.get(key)?;
    if access == Access::Write && !open.mode.is_write() {
        return Err(Error::KeyNotWritable);
    }
    let mut ks = inv.shared.keyspace.lock();
    op(&mut *ks, open.db, &open.name)
}

/// OpenKey: never fails because the key is missing.
pub(super) fn open_key(ctx: &mut Context, name: &[u8], mode: OpenMode) -> Result<KeyHandle> {
    let inv = invocation(ctx)?;
    Ok(inv.keys.insert(OpenKey {
        name: name.to_vec(),
        db: inv.db,
        mode,
        cursor: None,
    }))
}

/// CloseKey: also drops the key's range cursor.
pub(super) fn close_key(ctx: &mut Context, key: KeyHandle) -> Result<()> {
    let inv = invocation(ctx)?;
    match inv.keys.remove(key) {
        Ok(_) => Ok(()),
        Err(e) => inv.on_release_error(e),
    }
}

pub(super) fn key_type(ctx: &mut Context, key: KeyHandle) -> Result<KeyType> {
    with_key(ctx, key, Access::Read, |ks, db, name| Ok(ks.key_type(db, name)))
}

pub(super) fn value_length(ctx: &mut Context, key: KeyHandle) -> Result<usize> {
    with_key(ctx, key, Access::Read, |ks, db, name| {
        Ok(ks.get(db, name).map_or(0, StoredValue::len))
    })
}

pub(super) fn delete_key(ctx: &mut Context, key: KeyHandle) -> Result<()> {
    with_key(ctx, key, Access::Write, |ks, db, name| {
        ks.remove(db, name);
        Ok(())
    })
}

// ---------------------------------------------------------------------------
// Lists
// ---------------------------------------------------------------------------

pub(super) fn list_push(
    ctx: &mut Context,
    key: KeyHandle,
    end: ListEnd,
    element: &ModuleString,
) -> Result<usize> {
    with_key(ctx, key, Access::Write, |ks, db, name| {
        let len = match ks.get_or_create(db, name, KeyType::List)? {
            StoredValue::List(list) => {
                match end {
                    ListEnd::Head => list.push_front(element.as_bytes().to_vec()),
                    ListEnd::Tail => list.push_back(element.as_bytes().to_vec()),
                }
                list.len()
            }
            _ => return Err(Error::WrongType),
        };
        ks.mark_dirty();
        Ok(len)
    })
}

/// ListPop: `None` on an empty key. A list emptied by the pop is deleted.
pub(super) fn list_pop(ctx: &mut Context, key: KeyHandle, end: ListEnd) -> Result<Option<ModuleString>> {
    with_key(ctx, key, Access::Write, |ks, db, name| {
        let popped = match ks.get_mut(db, name) {
            None => return Ok(None),
            Some(StoredValue::List(list)) => match end {
                ListEnd::Head => list.pop_front(),
                ListEnd::Tail => list.pop_back(),
            },
            Some(_) => return Err(Error::WrongType),
        };
        ks.remove_if_empty(db, name);
        if popped.is_some() {
            ks.mark_dirty();
        }
        Ok(popped.map(ModuleString::from))
    })
}

// ---------------------------------------------------------------------------
// Strings
// ---------------------------------------------------------------------------

/// StringSet: replaces whatever the key held, deadline included.
pub(super) fn string_set(ctx: &mut Context, key: KeyHandle, value: &ModuleString) -> Result<()> {
    with_key(ctx, key, Access::Write, |ks, db, name| {
        ks.set(db, name, StoredValue::String(value.as_bytes().to_vec()));
        Ok(())
    })
}

/// StringDMA: writable view of the stored bytes, holding the keyspace lock
/// until it is dropped. An empty key becomes an empty string first.
pub(super) fn string_dma<'a>(ctx: &'a mut Context, key: KeyHandle) -> Result<StringDma<'a>> {
    let inv = invocation(ctx)?;
    let open = inv.keys.get(key)?;
    if !open.mode.is_write() {
        return Err(Error::KeyNotWritable);
    }
    let (db, name) = (open.db, open.name.as_slice());
    let mut ks = inv.shared.keyspace.lock();
    ks.get_or_create(db, name, KeyType::String)?;
    ks.mark_dirty();
    let bytes = MutexGuard::try_map(ks, |ks| match ks.get_mut(db, name) {
        Some(StoredValue::String(bytes)) => Some(bytes.as_mut_slice()),
        _ => None,
    })
    .map_err(|_| Error::WrongType)?;
    Ok(StringDma::new(bytes))
}

/// StringTruncate: shrink, or grow with zero bytes. Growing an empty key
/// creates it; truncating an empty key to zero leaves it empty.
pub(super) fn string_truncate(ctx: &mut Context, key: KeyHandle, len: usize) -> Result<()> {
    with_key(ctx, key, Access::Write, |ks, db, name| {
        match ks.get_mut(db, name) {
            None if len == 0 => {}
            None => ks.set(db, name, StoredValue::String(vec![0; len])),
            Some(StoredValue::String(bytes)) => {
                bytes.resize(len, 0);
                ks.mark_dirty();
            }
            Some(_) => return Err(Error::WrongType),
        }
        Ok(())
    })
}

// ---------------------------------------------------------------------------
// Expiry
// ---------------------------------------------------------------------------

/// GetExpire: remaining milliseconds, or `NO_EXPIRE`.
pub(super) fn get_expire(ctx: &mut Context, key: KeyHandle) -> Result<i64> {
    with_key(ctx, key, Access::Read, |ks, db, name| {
        if !ks.contains(db, name) {
            return Err(Error::invalid_value("no such key"));
        }
        Ok(match ks.deadline(db, name) {
            Some(at) => (at - ks.now_millis()).max(0),
            None => NO_EXPIRE,
        })
    })
}

/// SetExpire: milliseconds from now, or `NO_EXPIRE` to persist the key.
pub(super) fn set_expire(ctx: &mut Context, key: KeyHandle, millis: i64) -> Result<()> {
    with_key(ctx, key, Access::Write, |ks, db, name| {
        if !ks.contains(db, name) {
            return Err(Error::invalid_value("no such key"));
        }
        let deadline = match millis {
            NO_EXPIRE => None,
            m if m < 0 => return Err(Error::invalid_value("invalid expire time")),
            m => Some(
                ks.now_millis()
                    .checked_add(m)
                    .ok_or_else(|| Error::invalid_value("invalid expire time"))?,
            ),
        };
        ks.set_deadline(db, name, deadline);
        Ok(())
    })
}
