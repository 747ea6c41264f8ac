//! What replicas and the append-only log receive.

use ember::Engine;
use ember_module::prelude::*;

use crate::common::*;

/// Queues `X`, a replicated `INCR y` and `Z`, then asks for verbatim
/// propagation when given an extra argument.
fn mixed_replication(ctx: &mut Context, argv: &[ModuleString]) -> Status {
    ctx.auto_memory();
    reply_on_error(ctx, |ctx| {
        ctx.replicate("X", "", &[])?;
        let reply = CallBuilder::new("INCR")
            .buffer("y")
            .replicate_if_mutated()
            .invoke(ctx)?;
        ctx.replicate("Z", "", &[])?;
        if argv.len() > 1 {
            ctx.replicate_verbatim()?;
        }
        Ok(ctx.reply_with_call_reply(reply))
    })
}

fn mixed_on_load(ctx: &mut Context, _args: &[ModuleString]) -> Status {
    if ember_module::init(ctx, "mixed", 1, API_VERSION_1).is_err() {
        return Status::Err;
    }
    ctx.create_command("mixed.xyz", mixed_replication).into()
}

fn mixed_engine() -> Engine {
    init_tracing();
    let engine = Engine::ephemeral().unwrap();
    engine.load_module(mixed_on_load, &[]).unwrap();
    engine
}

#[test]
fn repl1_wraps_every_entry_in_one_transaction() {
    let engine = hello_engine();
    let mut session = engine.session();
    let offset = engine.replication_offset();
    assert_eq!(run(&mut session, &["hello.repl1"]), int(0));
    assert_eq!(
        propagated_since(&engine, offset),
        vec![
            cmd(&["MULTI"]),
            cmd(&["SELECT", "0"]),
            cmd(&["ECHO", "foo"]),
            cmd(&["INCR", "foo"]),
            cmd(&["INCR", "bar"]),
            cmd(&["EXEC"]),
        ]
    );
    assert_eq!(run(&mut session, &["get", "foo"]), bulk("1"));
    assert_eq!(run(&mut session, &["get", "bar"]), bulk("1"));
}

#[test]
fn failed_calls_are_not_replicated() {
    let engine = hello_engine();
    let mut session = engine.session();
    run(&mut session, &["set", "foo", "not a number"]);
    let offset = engine.replication_offset();
    run(&mut session, &["hello.repl1"]);
    assert_eq!(
        without_select(propagated_since(&engine, offset)),
        vec![
            cmd(&["MULTI"]),
            cmd(&["ECHO", "foo"]),
            cmd(&["INCR", "bar"]),
            cmd(&["EXEC"]),
        ]
    );
}

#[test]
fn repl2_propagates_verbatim() {
    let engine = hello_engine();
    let mut session = engine.session();
    run(&mut session, &["rpush", "l", "1", "2", "x"]);
    let offset = engine.replication_offset();
    assert_eq!(run(&mut session, &["hello.repl2", "l"]), int(6));
    assert_eq!(
        run(&mut session, &["lrange", "l", "0", "-1"]),
        ember::protocol::Frame::Array(vec![bulk("2"), bulk("3"), bulk("1")])
    );
    assert_eq!(
        without_select(propagated_since(&engine, offset)),
        vec![cmd(&["hello.repl2", "l"])]
    );
}

#[test]
fn toggle_case_on_absent_key_still_propagates() {
    let engine = hello_engine();
    let mut session = engine.session();
    let offset = engine.replication_offset();
    run(&mut session, &["hello.toggle.case", "missing"]);
    assert_eq!(
        without_select(propagated_since(&engine, offset)),
        vec![cmd(&["hello.toggle.case", "missing"])]
    );
}

#[test]
fn failed_commands_propagate_nothing() {
    let engine = hello_engine();
    let mut session = engine.session();
    run(&mut session, &["rpush", "l", "x"]);
    let offset = engine.replication_offset();
    run(&mut session, &["hello.toggle.case", "l"]);
    run(&mut session, &["hello.list.splice", "l", "d", "nope"]);
    assert_eq!(engine.replication_offset(), offset);
}

#[test]
fn unflagged_calls_are_not_replicated() {
    let engine = hello_engine();
    let mut session = engine.session();
    let offset = engine.replication_offset();
    run(&mut session, &["hello.push.call", "l", "a"]);
    run(&mut session, &["hello.push.native", "l", "b"]);
    assert_eq!(engine.replication_offset(), offset);
    assert_eq!(engine.last_invocation_report().unwrap().propagated, 0);
}

#[test]
fn builtin_writes_propagate_as_issued() {
    let engine = hello_engine();
    let mut session = engine.session();
    run(&mut session, &["select", "4"]);
    let offset = engine.replication_offset();
    run(&mut session, &["set", "k", "v"]);
    run(&mut session, &["get", "k"]);
    run(&mut session, &["sadd", "s", "a"]);
    run(&mut session, &["sadd", "s", "a"]);
    assert_eq!(
        propagated_since(&engine, offset),
        vec![
            cmd(&["SELECT", "4"]),
            cmd(&["set", "k", "v"]),
            cmd(&["sadd", "s", "a"]),
        ]
    );
}

#[test]
fn active_expiry_propagates_del() {
    let (engine, clock) = hello_engine_with_clock();
    let mut session = engine.session();
    run(&mut session, &["set", "k", "v"]);
    run(&mut session, &["pexpire", "k", "100"]);
    let offset = engine.replication_offset();

    clock.advance(200);
    assert_eq!(engine.active_expire_cycle(), 1);
    assert_eq!(
        without_select(propagated_since(&engine, offset)),
        vec![cmd(&["DEL", "k"])]
    );
}

#[test]
fn lazy_expiry_propagates_del_before_the_command() {
    let (engine, clock) = hello_engine_with_clock();
    let mut session = engine.session();
    run(&mut session, &["set", "k", "v"]);
    run(&mut session, &["pexpire", "k", "100"]);
    let offset = engine.replication_offset();

    clock.advance(200);
    assert_eq!(run(&mut session, &["append", "k", "w"]), int(1));
    assert_eq!(
        without_select(propagated_since(&engine, offset)),
        vec![cmd(&["DEL", "k"]), cmd(&["append", "k", "w"])]
    );
}

#[test]
fn repl2_on_an_absent_key_fails_and_propagates_nothing() {
    let engine = hello_engine();
    let mut session = engine.session();
    let offset = engine.replication_offset();
    assert!(is_error(&run(&mut session, &["hello.repl2", "missing"]), "WRONGTYPE"));
    assert!(propagated_since(&engine, offset).is_empty());
}

#[test]
fn replicate_and_flagged_calls_share_one_transaction() {
    let engine = mixed_engine();
    let mut session = engine.session();
    let offset = engine.replication_offset();
    assert_eq!(run(&mut session, &["mixed.xyz"]), int(1));
    assert_eq!(
        without_select(propagated_since(&engine, offset)),
        vec![
            cmd(&["MULTI"]),
            cmd(&["X"]),
            cmd(&["INCR", "y"]),
            cmd(&["Z"]),
            cmd(&["EXEC"]),
        ]
    );
}

#[test]
fn verbatim_replaces_everything_queued() {
    let engine = mixed_engine();
    let mut session = engine.session();
    let offset = engine.replication_offset();
    assert_eq!(run(&mut session, &["mixed.xyz", "v"]), int(1));
    assert_eq!(
        without_select(propagated_since(&engine, offset)),
        vec![cmd(&["mixed.xyz", "v"])]
    );
    assert_eq!(run(&mut session, &["get", "y"]), bulk("1"));
}
