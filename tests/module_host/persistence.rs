//! Append-only log written from propagation and replayed on open.

use std::path::PathBuf;

use ember::protocol::Frame;
use ember::{Engine, EngineConfig, CONFIG_FILE_NAME};
use tempfile::TempDir;

use crate::common::*;

fn aof_config() -> EngineConfig {
    EngineConfig {
        appendonly: Some(PathBuf::from("appendonly.aof")),
        appendfsync: "always".to_string(),
        ..EngineConfig::default()
    }
}

fn reopen(dir: &TempDir) -> Engine {
    let engine = Engine::open(dir.path()).unwrap();
    engine.load_module(ember_hello::on_load, &[]).unwrap();
    engine
}

#[test]
fn open_writes_a_default_config() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let engine = Engine::open(dir.path()).unwrap();
    assert!(dir.path().join(CONFIG_FILE_NAME).exists());
    assert_eq!(engine.config(), &EngineConfig::default());
}

#[test]
fn open_with_config_is_remembered() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    Engine::open_with_config(dir.path(), aof_config()).unwrap();
    let engine = Engine::open(dir.path()).unwrap();
    assert_eq!(engine.config(), &aof_config());
}

#[test]
fn module_effects_survive_replay() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    {
        let engine = Engine::open_with_config(dir.path(), aof_config()).unwrap();
        engine.load_module(ember_hello::on_load, &[]).unwrap();
        let mut session = engine.session();
        run(&mut session, &["set", "k", "MiXeD"]);
        run(&mut session, &["hello.toggle.case", "k"]);
        run(&mut session, &["hello.repl1"]);
        run(&mut session, &["rpush", "l", "1", "2"]);
        run(&mut session, &["hello.repl2", "l"]);
        run(&mut session, &["select", "2"]);
        run(&mut session, &["hello.push.call", "ignored", "x"]);
        run(&mut session, &["set", "x", "in db 2"]);
    }

    let engine = reopen(&dir);
    assert!(engine.load_append_only().unwrap() > 0);
    let mut session = engine.session();
    assert_eq!(run(&mut session, &["get", "k"]), bulk("mIxEd"));
    assert_eq!(run(&mut session, &["get", "foo"]), bulk("1"));
    assert_eq!(run(&mut session, &["get", "bar"]), bulk("1"));
    assert_eq!(
        run(&mut session, &["lrange", "l", "0", "-1"]),
        Frame::Array(vec![bulk("2"), bulk("3")])
    );
    run(&mut session, &["select", "2"]);
    assert_eq!(run(&mut session, &["get", "x"]), bulk("in db 2"));
    assert_eq!(run(&mut session, &["exists", "ignored"]), int(0));
}

#[test]
fn replay_does_not_repropagate() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    {
        let engine = Engine::open_with_config(dir.path(), aof_config()).unwrap();
        let mut session = engine.session();
        run(&mut session, &["set", "a", "1"]);
        run(&mut session, &["set", "b", "2"]);
    }
    let engine = Engine::open(dir.path()).unwrap();
    assert_eq!(engine.load_append_only().unwrap(), 3);
    assert_eq!(engine.replication_offset(), 0);

    let replayed = Engine::open(dir.path()).unwrap();
    assert_eq!(replayed.load_append_only().unwrap(), 3);
}

#[test]
fn engine_without_log_replays_nothing() {
    let engine = hello_engine();
    assert_eq!(engine.load_append_only().unwrap(), 0);
}
