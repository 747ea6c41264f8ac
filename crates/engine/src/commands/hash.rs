//! Hash commands.

use ember_core::{Error, Frame, KeyType, Result};
use ember_storage::StoredValue;

use super::{count, wrong_arity, BuiltinCtx};

/// HSET key field value [field value ...]
///
/// Replies with the number of fields that were added.
pub(crate) fn hset(ctx: &mut BuiltinCtx<'_>) -> Result<Frame> {
    if ctx.argv.len() % 2 != 0 {
        return Ok(wrong_arity("hset"));
    }
    let added = match ctx.ks.get_or_create(*ctx.db, &ctx.argv[1], KeyType::Hash)? {
        StoredValue::Hash(map) => ctx.argv[2..]
            .chunks_exact(2)
            .filter(|pair| map.insert(pair[0].clone(), pair[1].clone()).is_none())
            .count(),
        _ => return Err(Error::WrongType),
    };
    ctx.ks.mark_dirty();
    Ok(count(added))
}

/// HGET key field
pub(crate) fn hget(ctx: &mut BuiltinCtx<'_>) -> Result<Frame> {
    match ctx.ks.get(*ctx.db, &ctx.argv[1]) {
        None => Ok(Frame::Null),
        Some(StoredValue::Hash(map)) => Ok(map
            .get(ctx.argv[2].as_slice())
            .map_or(Frame::Null, |v| Frame::Bulk(v.clone()))),
        Some(_) => Err(Error::WrongType),
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::{bulk, Harness};
    use ember_core::Frame;

    #[test]
    fn test_hset_counts_new_fields() {
        let mut h = Harness::new();
        assert_eq!(h.run(&["HSET", "h", "a", "1", "b", "2"]), Frame::Integer(2));
        assert_eq!(h.run(&["HSET", "h", "a", "3"]), Frame::Integer(0));
        assert_eq!(h.run(&["HGET", "h", "a"]), bulk("3"));
        assert_eq!(h.run(&["HGET", "h", "zz"]), Frame::Null);
        assert_eq!(h.run(&["TYPE", "h"]), Frame::Simple("hash".into()));
    }

    #[test]
    fn test_hset_odd_pairs() {
        let mut h = Harness::new();
        assert!(matches!(h.run(&["HSET", "h", "a", "1", "b"]), Frame::Error(_)));
        assert_eq!(h.run(&["EXISTS", "h"]), Frame::Integer(0));
    }
}
