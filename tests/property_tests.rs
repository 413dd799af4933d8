//! Property-based tests using proptest.
//!
//! These tests verify invariants that should always hold,
//! helping find edge cases that unit tests might miss.

use bytes::Bytes;
use proptest::prelude::*;
use sack::commands::{CommandExecutor, ParsedCommand};
use sack::persistence::{self, AppendLog};
use sack::protocol::{parse_frame, Frame};
use sack::Store;
use std::sync::Arc;

/// Generate arbitrary keys
fn arb_key() -> impl Strategy<Value = Vec<u8>> {
    prop_oneof![
        // Small key space so writes collide
        "[a-c]{1,2}".prop_map(String::into_bytes),
        prop::collection::vec(any::<u8>(), 0..16),
    ]
}

/// Generate arbitrary values
fn arb_value() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..64)
}

/// Commands that change the store, plus reads and rejects mixed in.
fn arb_command() -> impl Strategy<Value = Vec<Vec<u8>>> {
    prop_oneof![
        (arb_key(), arb_value()).prop_map(|(k, v)| vec![b"SET".to_vec(), k, v]),
        (arb_key(), arb_key(), arb_value()).prop_map(|(h, f, v)| vec![b"hset".to_vec(), h, f, v]),
        arb_key().prop_map(|k| vec![b"GET".to_vec(), k]),
        arb_key().prop_map(|k| vec![b"SET".to_vec(), k]),
    ]
}

fn run(executor: &CommandExecutor, log: &AppendLog, parts: &[Vec<u8>]) {
    let frame = Frame::command(parts);
    let cmd = ParsedCommand::from_frame(frame.clone()).unwrap();
    let is_write = sack::commands::CommandId::lookup(cmd.name.as_bytes())
        .map(|id| id.is_write() && id.check_arity(cmd.arg_count()).is_ok())
        .unwrap_or(false);
    if is_write {
        log.append(&cmd.to_frame()).unwrap();
    }
    let _ = executor.execute(&cmd);
}

fn fresh_executor() -> CommandExecutor {
    CommandExecutor::new(Arc::new(Store::new()))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Replaying the log reproduces the live store, every time.
    #[test]
    fn prop_replay_is_deterministic(commands in prop::collection::vec(arb_command(), 0..40)) {
        let dir = tempfile::tempdir().unwrap();
        let log = AppendLog::open(dir.path().join("db.sack")).unwrap();

        let live = fresh_executor();
        for parts in &commands {
            run(&live, &log, parts);
        }

        let first = fresh_executor();
        let second = fresh_executor();
        persistence::load(&log, &first).unwrap();
        persistence::load(&log, &second).unwrap();

        prop_assert_eq!(first.store().strings_snapshot(), second.store().strings_snapshot());
        prop_assert_eq!(first.store().hashes_snapshot(), second.store().hashes_snapshot());
        prop_assert_eq!(first.store().strings_snapshot(), live.store().strings_snapshot());
        prop_assert_eq!(first.store().hashes_snapshot(), live.store().hashes_snapshot());
    }

    /// SET followed by GET returns the same bytes.
    #[test]
    fn prop_set_get_roundtrip(key in arb_key(), value in arb_value()) {
        let exec = fresh_executor();
        let set = ParsedCommand::new("SET", vec![Bytes::from(key.clone()), Bytes::from(value.clone())]);
        prop_assert_eq!(exec.execute(&set).unwrap(), Frame::ok());

        let get = ParsedCommand::new("GET", vec![Bytes::from(key)]);
        prop_assert_eq!(exec.execute(&get).unwrap(), Frame::Bulk(Bytes::from(value)));
    }

    /// A request survives encode then decode unchanged.
    #[test]
    fn prop_request_roundtrip(parts in prop::collection::vec(arb_value(), 1..8)) {
        let frame = Frame::command(&parts);
        let decoded = parse_frame(&frame.to_vec()).unwrap();
        prop_assert_eq!(decoded, frame);
    }

    /// Commands with the wrong number of arguments never touch the store.
    #[test]
    fn prop_bad_arity_leaves_store_empty(
        verb in prop::sample::select(vec!["SET", "GET", "DEL", "HSET", "HGET", "HGETALL"]),
        args in prop::collection::vec(arb_value(), 0..6),
    ) {
        let exec = fresh_executor();
        let cmd = ParsedCommand::new(verb, args.into_iter().map(Bytes::from).collect());
        let id = sack::commands::CommandId::lookup(verb.as_bytes()).unwrap();
        let result = exec.execute(&cmd);

        if id.check_arity(cmd.arg_count()).is_err() {
            prop_assert!(result.is_err());
            prop_assert_eq!(exec.store().string_count(), 0);
            prop_assert_eq!(exec.store().hash_count(), 0);
        } else {
            prop_assert!(result.is_ok());
        }
    }
}
