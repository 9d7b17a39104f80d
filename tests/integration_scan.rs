//! Integration tests for the scan engine.
//!
//! These exercise the public API end to end: multi-shard traversal,
//! classification, event emission and report sinks working together.

use redis_bigkeys::core::classifier::{KeyType, MemberCount};
use redis_bigkeys::core::client::InMemoryKeyspace;
use redis_bigkeys::core::reporter::{
    BigKeyRecord, CollectingSink, JsonLinesSink, ScanSummary, TeeSink,
};
use redis_bigkeys::core::scanner::{BigKeyScanner, ScanConfig};
use redis_bigkeys::events::{EventChannel, ScanEvent};
use std::collections::HashSet;
use tempfile::TempDir;

/// Three shards, mixed value types, a couple of keys designed to be
/// skipped. The big keys are known up front.
fn fixture_keyspace() -> InMemoryKeyspace {
    let mut keyspace = InMemoryKeyspace::with_shards(3);
    keyspace
        .insert(0, "session:huge", KeyType::String, 2_000_000, 1)
        .insert(0, "counter", KeyType::String, 64, 1)
        .insert(1, "leaderboard", KeyType::SortedSet, 800_000, 125_000)
        .insert(1, "queue:jobs", KeyType::List, 5_000, 12)
        .insert(1, "flaky", KeyType::Hash, 999_999, 10)
        .insert(2, "catalog", KeyType::Hash, 1_500_000, 40_000)
        .insert(2, "stream:audit", KeyType::Other, 3_000_000, 0);
    keyspace.insert_unsized(2, "unsizable", KeyType::String);
    keyspace.poison(b"flaky");
    keyspace
}

#[test]
fn full_scan_classifies_every_shard_and_skips_failures() {
    let mut keyspace = fixture_keyspace();
    let scanner = BigKeyScanner::new(ScanConfig {
        threshold_bytes: 100_000,
        batch_hint: 2,
    });

    let mut sink = CollectingSink::new();
    let summary = scanner.run(&mut keyspace, &mut sink).unwrap();

    assert_eq!(summary.shards, 3);
    assert_eq!(summary.keys_visited, 8);
    assert_eq!(summary.keys_skipped, 2); // poisoned + unsizable
    assert!(!summary.cancelled);

    let by_key: std::collections::HashMap<String, &BigKeyRecord> = sink
        .records()
        .iter()
        .map(|r| (r.key.render(), r))
        .collect();

    let expected: HashSet<&str> =
        ["session:huge", "leaderboard", "catalog", "stream:audit"].into();
    assert_eq!(
        by_key.keys().map(String::as_str).collect::<HashSet<_>>(),
        expected
    );

    assert_eq!(by_key["session:huge"].member_count, MemberCount::Count(1));
    assert_eq!(by_key["leaderboard"].member_count, MemberCount::Count(125_000));
    assert_eq!(by_key["catalog"].key_type, KeyType::Hash);
    // unknown type is reported, with no member count
    assert_eq!(
        by_key["stream:audit"].member_count,
        MemberCount::NotApplicable
    );
}

#[test]
fn event_stream_brackets_the_scan() {
    let mut keyspace = fixture_keyspace();
    let scanner = BigKeyScanner::new(ScanConfig {
        threshold_bytes: 100_000,
        batch_hint: 3,
    });

    let (sender, receiver) = EventChannel::new();
    let mut sink = CollectingSink::new();
    scanner
        .run_with_events(&mut keyspace, &mut sink, &sender)
        .unwrap();
    drop(sender);

    let events: Vec<ScanEvent> = receiver.iter().collect();

    assert!(matches!(events.first(), Some(ScanEvent::Started { shards: 3 })));
    assert!(matches!(events.last(), Some(ScanEvent::Completed { .. })));

    let shard_completions = events
        .iter()
        .filter(|e| matches!(e, ScanEvent::ShardCompleted { .. }))
        .count();
    assert_eq!(shard_completions, 3);

    let found = events
        .iter()
        .filter(|e| matches!(e, ScanEvent::BigKeyFound { .. }))
        .count();
    assert_eq!(found, sink.records().len());

    let skipped = events
        .iter()
        .filter(|e| matches!(e, ScanEvent::KeySkipped { .. }))
        .count();
    assert_eq!(skipped, 2);
}

#[test]
fn teed_report_file_matches_collected_records() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("bigkeys.jsonl");

    let mut keyspace = fixture_keyspace();
    let scanner = BigKeyScanner::new(ScanConfig {
        threshold_bytes: 100_000,
        batch_hint: 1000,
    });

    let mut collected = CollectingSink::new();
    let mut file_sink = JsonLinesSink::create(&path).unwrap();
    let summary = {
        let mut tee = TeeSink::new(&mut collected, &mut file_sink);
        scanner.run(&mut keyspace, &mut tee).unwrap()
    };
    drop(file_sink);

    let contents = std::fs::read_to_string(&path).unwrap();
    let mut lines = contents.lines().collect::<Vec<_>>();
    let summary_line = lines.pop().unwrap();

    let from_file: Vec<BigKeyRecord> = lines
        .iter()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    let file_keys: HashSet<String> = from_file.iter().map(|r| r.key.render()).collect();
    let collected_keys: HashSet<String> =
        collected.records().iter().map(|r| r.key.render()).collect();
    assert_eq!(file_keys, collected_keys);

    let file_summary: ScanSummary = serde_json::from_str(summary_line).unwrap();
    assert_eq!(file_summary.big_keys_found, summary.big_keys_found);
    assert_eq!(file_summary.keys_visited, summary.keys_visited);
}

#[test]
fn shard_fan_out_is_invisible_in_results() {
    // The same logical keyspace split 1-way and 3-ways must produce the
    // same qualifying set.
    let keys: [(&str, KeyType, u64, u64); 5] = [
        ("a", KeyType::String, 200_000, 1),
        ("b", KeyType::Hash, 50, 2),
        ("c", KeyType::Set, 150_000, 30),
        ("d", KeyType::List, 99_999, 400),
        ("e", KeyType::SortedSet, 100_001, 77),
    ];

    let mut single = InMemoryKeyspace::standalone();
    for (key, key_type, size, members) in keys {
        single.insert(0, key, key_type, size, members);
    }

    let mut sharded = InMemoryKeyspace::with_shards(3);
    for (i, (key, key_type, size, members)) in keys.into_iter().enumerate() {
        sharded.insert(i % 3, key, key_type, size, members);
    }

    let scanner = BigKeyScanner::new(ScanConfig {
        threshold_bytes: 100_000,
        batch_hint: 2,
    });

    let mut sink_single = CollectingSink::new();
    scanner.run(&mut single, &mut sink_single).unwrap();
    let mut sink_sharded = CollectingSink::new();
    scanner.run(&mut sharded, &mut sink_sharded).unwrap();

    let keys_single: HashSet<String> = sink_single
        .records()
        .iter()
        .map(|r| r.key.render())
        .collect();
    let keys_sharded: HashSet<String> = sink_sharded
        .records()
        .iter()
        .map(|r| r.key.render())
        .collect();

    assert_eq!(keys_single, keys_sharded);
    assert_eq!(
        keys_single,
        HashSet::from(["a".to_string(), "c".to_string(), "e".to_string()])
    );
}
