//! Module loading: binding, registration and load-time failures.

use ember::protocol::{Capability, Context, Error, ModuleString, Status, API_VERSION_1};
use ember::{get_api, Engine};
use ember_module::prelude::*;

use crate::common::*;

fn noop_command(ctx: &mut Context, _argv: &[ModuleString]) -> Status {
    ctx.reply_with_simple_string("OK")
}

fn duplicate_on_load(ctx: &mut Context, _args: &[ModuleString]) -> Status {
    if ember_module::init(ctx, "dup", 1, API_VERSION_1).is_err() {
        return Status::Err;
    }
    if ctx.create_command("dup.a", noop_command).is_err() {
        return Status::Err;
    }
    ctx.create_command("DUP.A", noop_command).into()
}

fn builtin_clash_on_load(ctx: &mut Context, _args: &[ModuleString]) -> Status {
    if ember_module::init(ctx, "clash", 1, API_VERSION_1).is_err() {
        return Status::Err;
    }
    ctx.create_command("get", noop_command).into()
}

fn future_api_on_load(ctx: &mut Context, _args: &[ModuleString]) -> Status {
    ember_module::init(ctx, "future", 1, 2).into()
}

fn anonymous_on_load(_ctx: &mut Context, _args: &[ModuleString]) -> Status {
    Status::Ok
}

fn late_register(ctx: &mut Context, _argv: &[ModuleString]) -> Status {
    match ctx.create_command("late.extra", noop_command) {
        Ok(()) => ctx.reply_with_simple_string("OK"),
        Err(e) => ctx.reply_with_result_error(&e),
    }
}

fn late_on_load(ctx: &mut Context, _args: &[ModuleString]) -> Status {
    if ember_module::init(ctx, "late", 1, API_VERSION_1).is_err() {
        return Status::Err;
    }
    ctx.create_command("late.register", late_register).into()
}

fn args_on_load(ctx: &mut Context, args: &[ModuleString]) -> Status {
    if args.len() != 2 || args[0].as_bytes() != b"alpha" {
        return Status::Err;
    }
    if ember_module::init(ctx, "args", 1, API_VERSION_1).is_err() {
        return Status::Err;
    }
    ctx.create_command("args.noop", noop_command).into()
}

fn without_replicate_verbatim(name: &str) -> Option<Capability> {
    match name {
        "ReplicateVerbatim" => None,
        other => get_api(other),
    }
}

fn with_swapped_create_command(name: &str) -> Option<Capability> {
    match name {
        "CreateCommand" => get_api("AutoMemory"),
        other => get_api(other),
    }
}

#[test]
fn hello_registers_every_command() {
    let engine = hello_engine();
    let modules = engine.modules();
    assert_eq!(modules.len(), 1);
    assert_eq!(modules[0].attribs.name, "helloworld");
    assert_eq!(modules[0].attribs.version, 1);
    assert_eq!(modules[0].attribs.api_version, API_VERSION_1);

    let mut registered = modules[0].commands.clone();
    registered.sort();
    let mut expected: Vec<String> = ember_hello::command_names().map(String::from).collect();
    expected.sort();
    assert_eq!(registered, expected);
}

#[test]
fn module_commands_are_case_insensitive() {
    let engine = hello_engine();
    let mut session = engine.session();
    assert_eq!(run(&mut session, &["HELLO.SIMPLE"]), int(0));
}

#[test]
fn hello_simple_reports_selected_db() {
    let engine = hello_engine();
    let mut session = engine.session();
    assert_eq!(run(&mut session, &["select", "3"]), ok());
    assert_eq!(run(&mut session, &["hello.simple"]), int(3));
}

#[test]
fn loading_twice_is_rejected() {
    let engine = hello_engine();
    let err = engine.load_module(ember_hello::on_load, &[]).unwrap_err();
    assert!(matches!(err, Error::ModuleAlreadyLoaded { name } if name == "helloworld"));
    assert_eq!(engine.modules().len(), 1);
}

#[test]
fn duplicate_command_fails_the_whole_load() {
    init_tracing();
    let engine = Engine::ephemeral().unwrap();
    let err = engine.load_module(duplicate_on_load, &[]).unwrap_err();
    assert!(matches!(err, Error::DuplicateCommand { name } if name == "DUP.A"));
    assert!(engine.modules().is_empty());

    let mut session = engine.session();
    assert!(is_error(&run(&mut session, &["dup.a"]), "ERR unknown command"));
}

#[test]
fn module_cannot_shadow_a_builtin() {
    init_tracing();
    let engine = Engine::ephemeral().unwrap();
    let err = engine.load_module(builtin_clash_on_load, &[]).unwrap_err();
    assert!(matches!(err, Error::DuplicateCommand { name } if name == "get"));

    let mut session = engine.session();
    assert_eq!(run(&mut session, &["set", "k", "v"]), ok());
    assert_eq!(run(&mut session, &["get", "k"]), bulk("v"));
}

#[test]
fn unsupported_api_version_fails_load() {
    init_tracing();
    let engine = Engine::ephemeral().unwrap();
    let err = engine.load_module(future_api_on_load, &[]).unwrap_err();
    assert!(matches!(err, Error::UnsupportedApiVersion { requested: 2 }));
    assert!(engine.modules().is_empty());
}

fn clash_then_recover_on_load(ctx: &mut Context, _args: &[ModuleString]) -> Status {
    if ember_module::init(ctx, "recover", 1, API_VERSION_1).is_err() {
        return Status::Err;
    }
    if ctx.create_command("set", noop_command).is_ok() {
        return Status::Err;
    }
    ctx.create_command("recover.noop", noop_command).into()
}

#[test]
fn rejected_call_does_not_fail_a_load_that_succeeds() {
    init_tracing();
    let engine = Engine::ephemeral().unwrap();
    engine.load_module(clash_then_recover_on_load, &[]).unwrap();

    let mut session = engine.session();
    assert_eq!(run(&mut session, &["recover.noop"]), ok());
}

#[test]
fn entry_point_must_declare_itself() {
    init_tracing();
    let engine = Engine::ephemeral().unwrap();
    let err = engine.load_module(anonymous_on_load, &[]).unwrap_err();
    assert!(matches!(err, Error::ModuleLoadFailed { reason } if reason.contains("name")));
}

#[test]
fn load_arguments_reach_the_entry_point() {
    init_tracing();
    let engine = Engine::ephemeral().unwrap();
    let err = engine.load_module(args_on_load, &["alpha"]).unwrap_err();
    assert!(matches!(err, Error::ModuleLoadFailed { .. }));
    engine.load_module(args_on_load, &["alpha", "beta"]).unwrap();

    let mut session = engine.session();
    assert_eq!(run(&mut session, &["args.noop"]), ok());
}

#[test]
fn commands_cannot_be_created_after_loading() {
    init_tracing();
    let engine = Engine::ephemeral().unwrap();
    engine.load_module(late_on_load, &[]).unwrap();

    let mut session = engine.session();
    assert!(is_error(&run(&mut session, &["late.register"]), "ERR"));
    assert!(is_error(&run(&mut session, &["late.extra"]), "ERR unknown command"));
}

#[test]
fn binding_fails_on_a_missing_capability() {
    let mut ctx = Context::new(without_replicate_verbatim, Box::new(()));
    let err = ember_module::init(&mut ctx, "partial", 1, API_VERSION_1).unwrap_err();
    assert!(matches!(err, Error::CapabilityMissing { name } if name == "ReplicateVerbatim"));
}

#[test]
fn binding_fails_on_a_mismatched_capability() {
    let mut ctx = Context::new(with_swapped_create_command, Box::new(()));
    let err = ember_module::init(&mut ctx, "swapped", 1, API_VERSION_1).unwrap_err();
    assert!(matches!(err, Error::CapabilityMismatch { name } if name == "CreateCommand"));
}

#[test]
fn every_capability_resolves() {
    for name in ember::protocol::CAPABILITY_NAMES {
        let capability = get_api(name).unwrap();
        assert_eq!(capability.name(), *name);
    }
    assert!(get_api("NoSuchCapability").is_none());
}

#[test]
fn unknown_command_is_an_error() {
    let engine = hello_engine();
    let mut session = engine.session();
    assert_eq!(
        run(&mut session, &["hello.nope"]),
        ember::protocol::Frame::Error("ERR unknown command 'hello.nope'".to_string())
    );
}
