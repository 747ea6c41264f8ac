use ember_module::prelude::*;

use crate::with_open_key;

/// `hello.zsumrange <key> <min> <max>`: sum of the scores in `[min, max]`.
///
/// Bounds use the `ZRANGEBYSCORE` syntax, so `(1` and `+inf` work too. The
/// key must hold a sorted set.
pub(crate) fn sum_range(ctx: &mut Context, argv: &[ModuleString]) -> Status {
    if argv.len() != 4 {
        return ctx.wrong_arity();
    }
    let range = match ZsetRange::parse_score(&argv[2], &argv[3]) {
        Ok(range) => range,
        Err(_) => return ctx.reply_with_error("ERR invalid range"),
    };
    reply_on_error(ctx, |ctx| {
        let sum = with_open_key(ctx, &argv[1], OpenMode::READ, |ctx, key| {
            if ctx.key_type(key)? != KeyType::ZSet {
                return Err(Error::WrongType);
            }
            ctx.zset_first_in_range(key, &range)?;
            let mut sum = 0.0;
            while !ctx.zset_range_end_reached(key)? {
                let (_, score) = ctx.zset_range_current_element(key)?;
                sum += score;
                ctx.zset_range_next(key)?;
            }
            ctx.zset_range_stop(key)?;
            Ok(sum)
        })?;
        Ok(ctx.reply_with_double(sum))
    })
}
