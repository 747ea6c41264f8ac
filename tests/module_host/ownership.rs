//! Ownership discipline: leaks, double releases, handle validity and the
//! single reply contract.

use ember::protocol::{Error, Frame};
use ember::{Engine, Ownership};
use ember_module::prelude::*;

use crate::common::*;

fn leak(ctx: &mut Context, argv: &[ModuleString]) -> Status {
    let _ = ctx.open_key(&argv[1], OpenMode::READ);
    let _ = ctx.call("PING", "", &[]);
    ctx.reply_with_simple_string("OK")
}

fn double_close(ctx: &mut Context, argv: &[ModuleString]) -> Status {
    reply_on_error(ctx, |ctx| {
        let key = ctx.open_key(&argv[1], OpenMode::READ)?;
        ctx.close_key(key)?;
        match ctx.close_key(key) {
            Err(Error::DoubleRelease { .. }) => Ok(ctx.reply_with_simple_string("DOUBLE")),
            Err(e) => Err(e),
            Ok(()) => Ok(ctx.reply_with_simple_string("ACCEPTED")),
        }
    })
}

fn scoped_double_close(ctx: &mut Context, argv: &[ModuleString]) -> Status {
    ctx.auto_memory();
    reply_on_error(ctx, |ctx| {
        let key = ctx.open_key(&argv[1], OpenMode::READ)?;
        ctx.close_key(key)?;
        ctx.close_key(key)?;
        let reply = ctx.call("PING", "", &[])?;
        ctx.free_call_reply(reply)?;
        ctx.free_call_reply(reply)?;
        Ok(ctx.reply_with_simple_string("OK"))
    })
}

fn no_reply(_ctx: &mut Context, _argv: &[ModuleString]) -> Status {
    Status::Ok
}

fn two_replies(ctx: &mut Context, _argv: &[ModuleString]) -> Status {
    ctx.reply_with_long_long(1);
    ctx.reply_with_long_long(2)
}

fn stale_element(ctx: &mut Context, argv: &[ModuleString]) -> Status {
    reply_on_error(ctx, |ctx| {
        let reply = CallBuilder::new("LRANGE")
            .string(&argv[1])
            .integer(0)
            .integer(-1)
            .invoke(ctx)?;
        let element = ctx
            .call_reply_array_element(reply, 0)?
            .ok_or_else(|| Error::invalid_value("empty list"))?;
        let before = ctx.call_reply_length(element)?;
        ctx.free_call_reply(element)?;
        let still_valid = ctx.call_reply_length(element)? == before;
        ctx.free_call_reply(reply)?;
        match ctx.call_reply_length(element) {
            Err(Error::InvalidHandle { .. }) if still_valid => Ok(ctx.reply_with_simple_string("OK")),
            other => Err(Error::invalid_value(format!("element outlived its root: {:?}", other))),
        }
    })
}

fn read_only_push(ctx: &mut Context, argv: &[ModuleString]) -> Status {
    reply_on_error(ctx, |ctx| {
        let key = ctx.open_key(&argv[1], OpenMode::READ)?;
        let pushed = ctx.list_push(key, ListEnd::Tail, &argv[2]);
        ctx.close_key(key)?;
        pushed?;
        Ok(ctx.reply_with_simple_string("OK"))
    })
}

fn cursor_without_seek(ctx: &mut Context, argv: &[ModuleString]) -> Status {
    reply_on_error(ctx, |ctx| {
        let key = ctx.open_key(&argv[1], OpenMode::READ)?;
        let current = ctx.zset_range_current_element(key);
        let at_end = ctx.zset_range_end_reached(key)?;
        ctx.close_key(key)?;
        match current {
            Err(Error::CursorNotActive) if at_end => Ok(ctx.reply_with_simple_string("OK")),
            Err(e) => Err(e),
            Ok(_) => Err(Error::invalid_value("cursor active without a seek")),
        }
    })
}

fn select_and_set(ctx: &mut Context, argv: &[ModuleString]) -> Status {
    ctx.auto_memory();
    reply_on_error(ctx, |ctx| {
        ctx.select_db(2)?;
        let reply = CallBuilder::new("SET")
            .string(&argv[1])
            .buffer("v")
            .invoke(ctx)?;
        Ok(ctx.reply_with_call_reply(reply))
    })
}

fn owner_on_load(ctx: &mut Context, _args: &[ModuleString]) -> Status {
    if ember_module::init(ctx, "owner", 1, API_VERSION_1).is_err() {
        return Status::Err;
    }
    let commands: [(&str, ember::protocol::CommandFn); 8] = [
        ("owner.leak", leak),
        ("owner.double", double_close),
        ("owner.scoped.double", scoped_double_close),
        ("owner.noreply", no_reply),
        ("owner.tworeplies", two_replies),
        ("owner.stale", stale_element),
        ("owner.readonly", read_only_push),
        ("owner.cursor", cursor_without_seek),
    ];
    for (name, handler) in commands {
        if ctx.create_command(name, handler).is_err() {
            return Status::Err;
        }
    }
    ctx.create_command("owner.select", select_and_set).into()
}

fn owner_engine() -> Engine {
    init_tracing();
    let engine = Engine::ephemeral().unwrap();
    engine.load_module(owner_on_load, &[]).unwrap();
    engine
}

#[test]
fn explicit_leaks_are_reported() {
    let engine = owner_engine();
    let mut session = engine.session();
    assert_eq!(run(&mut session, &["owner.leak", "k"]), ok());
    let report = engine.last_invocation_report().unwrap();
    assert_eq!(report.ownership, Ownership::Explicit);
    assert_eq!(report.leaked_keys, 1);
    assert_eq!(report.leaked_replies, 1);
}

#[test]
fn leaked_handles_do_not_survive_the_invocation() {
    let engine = owner_engine();
    let mut session = engine.session();
    for _ in 0..3 {
        run(&mut session, &["owner.leak", "k"]);
        assert_eq!(engine.last_invocation_report().unwrap().leaked_keys, 1);
    }
}

#[test]
fn explicit_double_release_is_an_error() {
    let engine = owner_engine();
    let mut session = engine.session();
    assert_eq!(
        run(&mut session, &["owner.double", "k"]),
        Frame::Simple("DOUBLE".to_string())
    );
    assert_eq!(engine.last_invocation_report().unwrap().double_releases, 1);
}

#[test]
fn scoped_double_release_is_a_no_op() {
    let engine = owner_engine();
    let mut session = engine.session();
    assert_eq!(run(&mut session, &["owner.scoped.double", "k"]), ok());
    let report = engine.last_invocation_report().unwrap();
    assert_eq!(report.ownership, Ownership::Scoped);
    assert_eq!(report.double_releases, 0);
    assert_eq!(report.leaked_keys, 0);
}

#[test]
fn missing_reply_becomes_an_error() {
    let engine = owner_engine();
    let mut session = engine.session();
    assert!(is_error(
        &run(&mut session, &["owner.noreply"]),
        "ERR command 'owner.noreply' produced no reply"
    ));
    assert!(engine.last_invocation_report().unwrap().missing_reply);
}

#[test]
fn extra_replies_are_dropped() {
    let engine = owner_engine();
    let mut session = engine.session();
    assert_eq!(run(&mut session, &["owner.tworeplies"]), int(1));
    let report = engine.last_invocation_report().unwrap();
    assert_eq!(report.dropped_replies, 1);
    assert!(!report.missing_reply);
}

#[test]
fn element_handles_die_with_their_root() {
    let engine = owner_engine();
    let mut session = engine.session();
    run(&mut session, &["rpush", "l", "abc"]);
    assert_eq!(run(&mut session, &["owner.stale", "l"]), ok());
    assert_eq!(engine.last_invocation_report().unwrap().leaked_replies, 0);
}

#[test]
fn read_handles_reject_writes() {
    let engine = owner_engine();
    let mut session = engine.session();
    assert!(is_error(&run(&mut session, &["owner.readonly", "l", "x"]), "ERR"));
    assert_eq!(run(&mut session, &["exists", "l"]), int(0));
}

#[test]
fn cursor_requires_a_seek() {
    let engine = owner_engine();
    let mut session = engine.session();
    run(&mut session, &["zadd", "z", "1", "a"]);
    assert_eq!(run(&mut session, &["owner.cursor", "z"]), ok());
}

#[test]
fn module_select_carries_over_to_the_session() {
    let engine = owner_engine();
    let mut session = engine.session();
    assert_eq!(run(&mut session, &["owner.select", "k"]), ok());
    assert_eq!(session.db(), 2);
    assert_eq!(run(&mut session, &["get", "k"]), bulk("v"));
    run(&mut session, &["select", "0"]);
    assert_eq!(run(&mut session, &["exists", "k"]), int(0));
}
