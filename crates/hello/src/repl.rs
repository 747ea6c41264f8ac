use ember_module::prelude::*;

/// `hello.repl1`: one replicated command and two replicated calls, which
/// propagate together inside `MULTI`/`EXEC`.
pub(crate) fn repl1(ctx: &mut Context, _argv: &[ModuleString]) -> Status {
    ctx.auto_memory();
    reply_on_error(ctx, |ctx| {
        CallBuilder::new("ECHO").buffer("foo").replicate(ctx)?;
        CallBuilder::new("INCR")
            .buffer("foo")
            .replicate_if_mutated()
            .invoke(ctx)?;
        CallBuilder::new("INCR")
            .buffer("bar")
            .replicate_if_mutated()
            .invoke(ctx)?;
        Ok(ctx.reply_with_long_long(0))
    })
}

/// `hello.repl2 <key>`: increment every integer in a list in place,
/// replying with the sum of the new values. Elements that are not integers
/// count as 0. Replicas receive the command itself. The key must hold a
/// list.
pub(crate) fn repl2(ctx: &mut Context, argv: &[ModuleString]) -> Status {
    if argv.len() != 2 {
        return ctx.wrong_arity();
    }
    ctx.auto_memory();
    reply_on_error(ctx, |ctx| {
        let key = ctx.open_key(&argv[1], OpenMode::READ_WRITE)?;
        if ctx.key_type(key)? != KeyType::List {
            return Err(Error::WrongType);
        }
        let mut sum: i64 = 0;
        for _ in 0..ctx.value_length(key)? {
            let Some(element) = ctx.list_pop(key, ListEnd::Tail)? else {
                break;
            };
            let value = element.parse_i64().unwrap_or(0).saturating_add(1);
            sum = sum.saturating_add(value);
            ctx.list_push(key, ListEnd::Head, &ModuleString::from_i64(value))?;
        }
        ctx.replicate_verbatim()?;
        Ok(ctx.reply_with_long_long(sum))
    })
}
