use ember_module::prelude::*;

use crate::with_open_key;

/// `hello.push.native <key> <value>`: RPUSH through a key handle.
pub(crate) fn push_native(ctx: &mut Context, argv: &[ModuleString]) -> Status {
    if argv.len() != 3 {
        return ctx.wrong_arity();
    }
    reply_on_error(ctx, |ctx| {
        let len = with_open_key(ctx, &argv[1], OpenMode::READ_WRITE, |ctx, key| {
            ctx.list_push(key, ListEnd::Tail, &argv[2])?;
            ctx.value_length(key)
        })?;
        Ok(ctx.reply_with_long_long(len as i64))
    })
}

/// `hello.push.call <key> <value>`: RPUSH through a nested call.
pub(crate) fn push_call(ctx: &mut Context, argv: &[ModuleString]) -> Status {
    if argv.len() != 3 {
        return ctx.wrong_arity();
    }
    reply_on_error(ctx, |ctx| {
        let reply = CallBuilder::new("RPUSH")
            .string(&argv[1])
            .string(&argv[2])
            .invoke(ctx)?;
        let status = if ctx.call_reply_type(reply)? == ReplyType::Integer {
            let len = ctx.call_reply_integer(reply)?;
            ctx.reply_with_long_long(len)
        } else {
            ctx.reply_with_call_reply(reply)
        };
        ctx.free_call_reply(reply)?;
        Ok(status)
    })
}

/// `hello.push.call2 <key> <value>`: like `hello.push.call`, relaying the
/// nested reply unchanged.
pub(crate) fn push_call_relay(ctx: &mut Context, argv: &[ModuleString]) -> Status {
    if argv.len() != 3 {
        return ctx.wrong_arity();
    }
    reply_on_error(ctx, |ctx| {
        let reply = CallBuilder::new("RPUSH")
            .string(&argv[1])
            .string(&argv[2])
            .invoke(ctx)?;
        let status = ctx.reply_with_call_reply(reply);
        ctx.free_call_reply(reply)?;
        Ok(status)
    })
}

/// `hello.list.sum.len <key>`: total length of every list element.
pub(crate) fn sum_len(ctx: &mut Context, argv: &[ModuleString]) -> Status {
    if argv.len() != 2 {
        return ctx.wrong_arity();
    }
    reply_on_error(ctx, |ctx| {
        let reply = CallBuilder::new("LRANGE")
            .string(&argv[1])
            .integer(0)
            .integer(-1)
            .invoke(ctx)?;
        let status = if ctx.call_reply_type(reply)? == ReplyType::Array {
            let mut total = 0;
            for i in 0..ctx.call_reply_length(reply)? {
                if let Some(element) = ctx.call_reply_array_element(reply, i)? {
                    total += ctx.call_reply_length(element)?;
                }
            }
            ctx.reply_with_long_long(total as i64)
        } else {
            ctx.reply_with_call_reply(reply)
        };
        ctx.free_call_reply(reply)?;
        Ok(status)
    })
}

/// `hello.list.splice <src> <dst> <count>`: move up to `count` elements from
/// the tail of `src` to the head of `dst`, replying with what is left in
/// `src`.
pub(crate) fn splice(ctx: &mut Context, argv: &[ModuleString]) -> Status {
    if argv.len() != 4 {
        return ctx.wrong_arity();
    }
    let count = match splice_count(&argv[3]) {
        Some(count) => count,
        None => return ctx.reply_with_error("ERR invalid count"),
    };
    reply_on_error(ctx, |ctx| {
        let remaining = with_open_key(ctx, &argv[1], OpenMode::READ_WRITE, |ctx, src| {
            with_open_key(ctx, &argv[2], OpenMode::READ_WRITE, |ctx, dst| {
                move_elements(ctx, src, dst, count)
            })
        })?;
        Ok(ctx.reply_with_long_long(remaining as i64))
    })
}

/// `hello.list.splice.auto`: `hello.list.splice` leaving its key handles to
/// automatic release.
pub(crate) fn splice_auto(ctx: &mut Context, argv: &[ModuleString]) -> Status {
    if argv.len() != 4 {
        return ctx.wrong_arity();
    }
    ctx.auto_memory();
    let count = match splice_count(&argv[3]) {
        Some(count) => count,
        None => return ctx.reply_with_error("ERR invalid count"),
    };
    reply_on_error(ctx, |ctx| {
        let src = ctx.open_key(&argv[1], OpenMode::READ_WRITE)?;
        let dst = ctx.open_key(&argv[2], OpenMode::READ_WRITE)?;
        let remaining = move_elements(ctx, src, dst, count)?;
        Ok(ctx.reply_with_long_long(remaining as i64))
    })
}

fn splice_count(arg: &ModuleString) -> Option<usize> {
    match arg.parse_i64() {
        Ok(n) if n >= 0 => usize::try_from(n).ok(),
        _ => None,
    }
}

/// Both keys are type-checked before either is touched.
fn move_elements(ctx: &mut Context, src: KeyHandle, dst: KeyHandle, count: usize) -> Result<usize> {
    if !ctx.key_type(src)?.is_empty_or(KeyType::List)
        || !ctx.key_type(dst)?.is_empty_or(KeyType::List)
    {
        return Err(Error::WrongType);
    }
    for _ in 0..count {
        match ctx.list_pop(src, ListEnd::Tail)? {
            Some(element) => {
                ctx.list_push(dst, ListEnd::Head, &element)?;
            }
            None => break,
        }
    }
    ctx.value_length(src)
}
