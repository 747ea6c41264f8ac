//! String access, expiry and streamed replies.

use ember::protocol::Frame;

use crate::common::*;

#[test]
fn toggle_case_rewrites_in_place() {
    let engine = hello_engine();
    let mut session = engine.session();
    run(&mut session, &["set", "k", "Hello, World"]);
    assert_eq!(run(&mut session, &["hello.toggle.case", "k"]), ok());
    assert_eq!(run(&mut session, &["get", "k"]), bulk("hELLO, wORLD"));
    assert_eq!(run(&mut session, &["hello.toggle.case", "k"]), ok());
    assert_eq!(run(&mut session, &["get", "k"]), bulk("Hello, World"));
}

#[test]
fn toggle_case_keeps_the_deadline() {
    let (engine, _clock) = hello_engine_with_clock();
    let mut session = engine.session();
    run(&mut session, &["set", "k", "abc"]);
    run(&mut session, &["pexpire", "k", "5000"]);
    run(&mut session, &["hello.toggle.case", "k"]);
    assert_eq!(run(&mut session, &["pttl", "k"]), int(5000));
}

#[test]
fn toggle_case_on_absent_key_creates_nothing() {
    let engine = hello_engine();
    let mut session = engine.session();
    assert_eq!(run(&mut session, &["hello.toggle.case", "missing"]), ok());
    assert_eq!(run(&mut session, &["exists", "missing"]), int(0));
}

#[test]
fn toggle_case_rejects_non_strings() {
    let engine = hello_engine();
    let mut session = engine.session();
    run(&mut session, &["rpush", "l", "Ab"]);
    assert!(is_error(&run(&mut session, &["hello.toggle.case", "l"]), "WRONGTYPE"));
    assert_eq!(run(&mut session, &["lrange", "l", "0", "-1"]), Frame::Array(vec![bulk("Ab")]));
    assert_eq!(engine.last_invocation_report().unwrap().leaked_keys, 0);
}

#[test]
fn more_expire_extends_existing_ttl() {
    let (engine, clock) = hello_engine_with_clock();
    let mut session = engine.session();
    run(&mut session, &["set", "k", "v"]);
    run(&mut session, &["pexpire", "k", "1000"]);
    assert_eq!(run(&mut session, &["hello.more.expire", "k", "500"]), ok());
    assert_eq!(run(&mut session, &["pttl", "k"]), int(1500));

    clock.advance(1400);
    assert_eq!(run(&mut session, &["get", "k"]), bulk("v"));
    clock.advance(200);
    assert_eq!(run(&mut session, &["get", "k"]), Frame::Null);
}

#[test]
fn more_expire_leaves_persistent_and_missing_keys_alone() {
    let (engine, _clock) = hello_engine_with_clock();
    let mut session = engine.session();
    run(&mut session, &["set", "k", "v"]);
    assert_eq!(run(&mut session, &["hello.more.expire", "k", "500"]), ok());
    assert_eq!(run(&mut session, &["pttl", "k"]), int(-1));
    assert_eq!(run(&mut session, &["hello.more.expire", "missing", "500"]), ok());
    assert_eq!(run(&mut session, &["exists", "missing"]), int(0));
}

#[test]
fn more_expire_rejects_bad_durations() {
    let engine = hello_engine();
    let mut session = engine.session();
    assert_eq!(
        run(&mut session, &["hello.more.expire", "k", "soon"]),
        Frame::Error("ERR invalid expire time".to_string())
    );
}

#[test]
fn rand_array_streams_count_integers() {
    let engine = hello_engine();
    let mut session = engine.session();
    match run(&mut session, &["hello.rand.array", "5"]) {
        Frame::Array(items) => {
            assert_eq!(items.len(), 5);
            assert!(items.iter().all(|item| matches!(item, Frame::Integer(n) if *n >= 0)));
        }
        other => panic!("unexpected reply {:?}", other),
    }
    assert_eq!(run(&mut session, &["hello.rand.array", "0"]), Frame::Array(vec![]));
}

#[test]
fn rand_array_rejects_bad_counts() {
    let engine = hello_engine();
    let mut session = engine.session();
    for count in ["-1", "many"] {
        assert_eq!(
            run(&mut session, &["hello.rand.array", count]),
            Frame::Error("ERR invalid count".to_string())
        );
    }
    assert!(!engine.last_invocation_report().unwrap().missing_reply);
}
