//! Shared helpers for the module host suite.

#![allow(dead_code)]

use std::sync::Arc;

use ember::protocol::Frame;
use ember::{Engine, EngineConfig, ManualClock, Session};

/// Install a tracing subscriber once; `RUST_LOG` controls verbosity.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Ephemeral engine with `helloworld` loaded.
pub fn hello_engine() -> Engine {
    init_tracing();
    let engine = Engine::ephemeral().unwrap();
    engine.load_module(ember_hello::on_load, &[]).unwrap();
    engine
}

/// Engine with `helloworld` loaded, driven by a manual clock at t=1000ms.
pub fn hello_engine_with_clock() -> (Engine, Arc<ManualClock>) {
    init_tracing();
    let clock = Arc::new(ManualClock::new(1_000));
    let engine = Engine::with_clock(EngineConfig::default(), clock.clone()).unwrap();
    engine.load_module(ember_hello::on_load, &[]).unwrap();
    (engine, clock)
}

pub fn run(session: &mut Session, argv: &[&str]) -> Frame {
    session.execute(argv)
}

pub fn bulk(s: &str) -> Frame {
    Frame::Bulk(s.as_bytes().to_vec())
}

pub fn int(n: i64) -> Frame {
    Frame::Integer(n)
}

pub fn ok() -> Frame {
    Frame::Simple("OK".to_string())
}

pub fn is_error(frame: &Frame, prefix: &str) -> bool {
    matches!(frame, Frame::Error(msg) if msg.starts_with(prefix))
}

pub fn cmd(parts: &[&str]) -> Vec<Vec<u8>> {
    parts.iter().map(|p| p.as_bytes().to_vec()).collect()
}

/// Backlog entries appended since `offset`, oldest first.
pub fn propagated_since(engine: &Engine, offset: u64) -> Vec<Vec<Vec<u8>>> {
    let added = (engine.replication_offset() - offset) as usize;
    let backlog = engine.replication_backlog();
    backlog[backlog.len() - added..].to_vec()
}

/// Propagated entries with `SELECT` markers removed.
pub fn without_select(entries: Vec<Vec<Vec<u8>>>) -> Vec<Vec<Vec<u8>>> {
    entries
        .into_iter()
        .filter(|argv| !argv[0].eq_ignore_ascii_case(b"SELECT"))
        .collect()
}
