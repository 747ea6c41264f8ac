use ember_module::prelude::*;
use rand::Rng;

/// `hello.simple`: reply with the selected database.
pub(crate) fn simple(ctx: &mut Context, _argv: &[ModuleString]) -> Status {
    let db = ctx.selected_db();
    ctx.reply_with_long_long(db as i64)
}

/// `hello.rand.array <count>`: an array of `count` random integers.
pub(crate) fn rand_array(ctx: &mut Context, argv: &[ModuleString]) -> Status {
    if argv.len() != 2 {
        return ctx.wrong_arity();
    }
    let count = match argv[1].parse_i64() {
        Ok(n) if n >= 0 => n as usize,
        _ => return ctx.reply_with_error("ERR invalid count"),
    };
    let mut rng = rand::thread_rng();
    ctx.reply_with_array(count);
    for _ in 0..count {
        ctx.reply_with_long_long(rng.gen_range(0..i64::from(i32::MAX)));
    }
    Status::Ok
}

/// `hello.more.expire <key> <ms>`: extend an existing time to live.
///
/// Keys without a time to live are left alone.
pub(crate) fn more_expire(ctx: &mut Context, argv: &[ModuleString]) -> Status {
    ctx.auto_memory();
    if argv.len() != 3 {
        return ctx.wrong_arity();
    }
    let extra = match argv[2].parse_i64() {
        Ok(ms) => ms,
        Err(_) => return ctx.reply_with_error("ERR invalid expire time"),
    };
    reply_on_error(ctx, |ctx| {
        let key = ctx.open_key(&argv[1], OpenMode::READ_WRITE)?;
        if ctx.key_type(key)? == KeyType::Empty {
            return Ok(ctx.reply_with_simple_string("OK"));
        }
        let ttl = ctx.get_expire(key)?;
        if ttl != NO_EXPIRE {
            let extended = ttl
                .checked_add(extra)
                .ok_or_else(|| Error::invalid_value("invalid expire time"))?;
            ctx.set_expire(key, extended)?;
        }
        Ok(ctx.reply_with_simple_string("OK"))
    })
}
