//! Set commands.

use ember_core::{Error, Frame, KeyType, Result};
use ember_storage::StoredValue;

use super::{count, BuiltinCtx};

/// SADD key member [member ...]
pub(crate) fn sadd(ctx: &mut BuiltinCtx<'_>) -> Result<Frame> {
    let added = match ctx.ks.get_or_create(*ctx.db, &ctx.argv[1], KeyType::Set)? {
        StoredValue::Set(members) => ctx.argv[2..]
            .iter()
            .filter(|member| members.insert(member.to_vec()))
            .count(),
        _ => return Err(Error::WrongType),
    };
    if added > 0 {
        ctx.ks.mark_dirty();
    }
    Ok(count(added))
}

/// SCARD key
pub(crate) fn scard(ctx: &mut BuiltinCtx<'_>) -> Result<Frame> {
    match ctx.ks.get(*ctx.db, &ctx.argv[1]) {
        None => Ok(Frame::Integer(0)),
        Some(StoredValue::Set(members)) => Ok(count(members.len())),
        Some(_) => Err(Error::WrongType),
    }
}
