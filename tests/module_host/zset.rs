//! Sorted set range cursors.

use ember::protocol::Frame;

use crate::common::*;

fn setup(session: &mut ember::Session) {
    run(session, &["zadd", "z", "1", "a", "2", "b", "3", "c"]);
}

#[test]
fn sums_scores_in_range() {
    let engine = hello_engine();
    let mut session = engine.session();
    setup(&mut session);
    assert_eq!(run(&mut session, &["hello.zsumrange", "z", "1", "2"]), bulk("3"));
    assert_eq!(run(&mut session, &["hello.zsumrange", "z", "2", "2"]), bulk("2"));
    assert_eq!(run(&mut session, &["hello.zsumrange", "z", "-inf", "+inf"]), bulk("6"));
    assert_eq!(run(&mut session, &["hello.zsumrange", "z", "(1", "3"]), bulk("5"));
}

#[test]
fn empty_ranges_sum_to_zero() {
    let engine = hello_engine();
    let mut session = engine.session();
    setup(&mut session);
    assert_eq!(run(&mut session, &["hello.zsumrange", "z", "5", "9"]), bulk("0"));
    assert_eq!(run(&mut session, &["hello.zsumrange", "z", "3", "1"]), bulk("0"));
}

#[test]
fn absent_key_is_the_wrong_type() {
    let engine = hello_engine();
    let mut session = engine.session();
    assert!(is_error(&run(&mut session, &["hello.zsumrange", "missing", "0", "9"]), "WRONGTYPE"));
}

#[test]
fn invalid_bounds_are_rejected() {
    let engine = hello_engine();
    let mut session = engine.session();
    setup(&mut session);
    assert_eq!(
        run(&mut session, &["hello.zsumrange", "z", "low", "2"]),
        Frame::Error("ERR invalid range".to_string())
    );
}

#[test]
fn wrong_type_fails_before_any_cursor() {
    let engine = hello_engine();
    let mut session = engine.session();
    run(&mut session, &["rpush", "l", "x"]);
    assert!(is_error(&run(&mut session, &["hello.zsumrange", "l", "0", "1"]), "WRONGTYPE"));
    let report = engine.last_invocation_report().unwrap();
    assert_eq!(report.leaked_keys, 0);
    assert_eq!(run(&mut session, &["type", "l"]), Frame::Simple("list".to_string()));
}
