//! List commands: key handles, nested calls and splicing.

use ember::protocol::Frame;
use proptest::prelude::*;

use crate::common::*;

fn lrange(session: &mut ember::Session, key: &str) -> Vec<String> {
    match run(session, &["lrange", key, "0", "-1"]) {
        Frame::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Frame::Bulk(bytes) => String::from_utf8(bytes).unwrap(),
                other => panic!("unexpected element {:?}", other),
            })
            .collect(),
        other => panic!("unexpected reply {:?}", other),
    }
}

#[test]
fn push_variants_report_new_length() {
    let engine = hello_engine();
    let mut session = engine.session();
    assert_eq!(run(&mut session, &["hello.push.native", "l", "a"]), int(1));
    assert_eq!(run(&mut session, &["hello.push.call", "l", "b"]), int(2));
    assert_eq!(run(&mut session, &["hello.push.call2", "l", "c"]), int(3));
    assert_eq!(lrange(&mut session, "l"), vec!["a", "b", "c"]);

    let report = engine.last_invocation_report().unwrap();
    assert_eq!(report.command, "hello.push.call2");
    assert_eq!(report.leaked_keys, 0);
    assert_eq!(report.leaked_replies, 0);
}

#[test]
fn push_against_wrong_type() {
    let engine = hello_engine();
    let mut session = engine.session();
    run(&mut session, &["set", "s", "x"]);
    assert!(is_error(&run(&mut session, &["hello.push.native", "s", "a"]), "WRONGTYPE"));
    assert!(is_error(&run(&mut session, &["hello.push.call", "s", "a"]), "WRONGTYPE"));
    assert!(is_error(&run(&mut session, &["hello.push.call2", "s", "a"]), "WRONGTYPE"));
    assert_eq!(run(&mut session, &["get", "s"]), bulk("x"));
}

#[test]
fn push_wrong_arity() {
    let engine = hello_engine();
    let mut session = engine.session();
    assert_eq!(
        run(&mut session, &["hello.push.native", "l"]),
        Frame::Error("ERR wrong number of arguments for 'hello.push.native' command".to_string())
    );
}

#[test]
fn sum_len_adds_element_lengths() {
    let engine = hello_engine();
    let mut session = engine.session();
    run(&mut session, &["rpush", "l", "a", "bb", "ccc"]);
    assert_eq!(run(&mut session, &["hello.list.sum.len", "l"]), int(6));
    assert_eq!(run(&mut session, &["hello.list.sum.len", "missing"]), int(0));

    let report = engine.last_invocation_report().unwrap();
    assert_eq!(report.leaked_replies, 0);
    assert_eq!(report.double_releases, 0);
}

#[test]
fn sum_len_relays_errors() {
    let engine = hello_engine();
    let mut session = engine.session();
    run(&mut session, &["set", "s", "x"]);
    assert!(is_error(&run(&mut session, &["hello.list.sum.len", "s"]), "WRONGTYPE"));
}

#[test]
fn splice_moves_tail_to_head() {
    let engine = hello_engine();
    let mut session = engine.session();
    run(&mut session, &["rpush", "src", "1", "2", "3"]);
    assert_eq!(run(&mut session, &["hello.list.splice", "src", "dst", "2"]), int(1));
    assert_eq!(lrange(&mut session, "src"), vec!["1"]);
    assert_eq!(lrange(&mut session, "dst"), vec!["2", "3"]);
}

#[test]
fn splice_count_is_clamped_to_source_length() {
    let engine = hello_engine();
    let mut session = engine.session();
    run(&mut session, &["rpush", "src", "1", "2", "3"]);
    assert_eq!(run(&mut session, &["hello.list.splice", "src", "dst", "10"]), int(0));
    assert_eq!(run(&mut session, &["exists", "src"]), int(0));
    assert_eq!(lrange(&mut session, "dst"), vec!["1", "2", "3"]);
}

#[test]
fn splice_rejects_bad_counts() {
    let engine = hello_engine();
    let mut session = engine.session();
    for count in ["-1", "abc", "1.5"] {
        assert_eq!(
            run(&mut session, &["hello.list.splice", "src", "dst", count]),
            Frame::Error("ERR invalid count".to_string())
        );
    }
}

#[test]
fn splice_checks_both_types_before_mutating() {
    let engine = hello_engine();
    let mut session = engine.session();
    run(&mut session, &["rpush", "src", "1", "2", "3"]);
    run(&mut session, &["set", "dst", "x"]);
    for command in ["hello.list.splice", "hello.list.splice.auto"] {
        assert!(is_error(&run(&mut session, &[command, "src", "dst", "2"]), "WRONGTYPE"));
        assert_eq!(run(&mut session, &["llen", "src"]), int(3));
    }
    let report = engine.last_invocation_report().unwrap();
    assert_eq!(report.leaked_keys, 0);
}

#[test]
fn splice_auto_matches_explicit() {
    let engine = hello_engine();
    let mut session = engine.session();
    run(&mut session, &["rpush", "a", "1", "2", "3", "4"]);
    run(&mut session, &["rpush", "b", "1", "2", "3", "4"]);

    assert_eq!(run(&mut session, &["hello.list.splice", "a", "a2", "3"]), int(1));
    let explicit = engine.last_invocation_report().unwrap();
    assert_eq!(run(&mut session, &["hello.list.splice.auto", "b", "b2", "3"]), int(1));
    let scoped = engine.last_invocation_report().unwrap();

    assert_eq!(lrange(&mut session, "a2"), lrange(&mut session, "b2"));
    assert_eq!(explicit.ownership, ember::Ownership::Explicit);
    assert_eq!(scoped.ownership, ember::Ownership::Scoped);
    assert_eq!(explicit.leaked_keys + scoped.leaked_keys, 0);
}

#[derive(Debug, Clone, Copy)]
enum Push {
    Native,
    Call,
    Relay,
}

fn push_strategy() -> impl Strategy<Value = Vec<(Push, String)>> {
    prop::collection::vec(
        (
            prop_oneof![Just(Push::Native), Just(Push::Call), Just(Push::Relay)],
            "[a-z0-9]{0,8}",
        ),
        1..24,
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn every_push_path_appends_in_order(pushes in push_strategy()) {
        let engine = hello_engine();
        let mut session = engine.session();
        for (i, (push, value)) in pushes.iter().enumerate() {
            let command = match push {
                Push::Native => "hello.push.native",
                Push::Call => "hello.push.call",
                Push::Relay => "hello.push.call2",
            };
            let reply = run(&mut session, &[command, "l", value.as_str()]);
            prop_assert_eq!(reply, int(i as i64 + 1));
        }
        let expected: Vec<String> = pushes.into_iter().map(|(_, v)| v).collect();
        prop_assert_eq!(lrange(&mut session, "l"), expected);
    }
}
