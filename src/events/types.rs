//! Event type definitions for scan progress reporting.

use crate::core::reporter::{BigKeyRecord, ScanSummary};
use serde::{Deserialize, Serialize};

/// All events emitted during a keyspace scan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ScanEvent {
    /// The scan has started
    Started {
        /// Number of shards that will be traversed
        shards: usize,
    },
    /// A shard's cursor sequence has started
    ShardStarted { shard: String },
    /// A batch of keys was fetched and processed
    Progress(ScanProgress),
    /// A key exceeded the threshold
    BigKeyFound { record: BigKeyRecord },
    /// A per-key query failed; the key was skipped and the scan continues
    KeySkipped { key: String, reason: String },
    /// A shard's cursor returned to zero
    ShardCompleted { shard: String, keys_visited: u64 },
    /// The scan was interrupted before completing all shards
    Cancelled { keys_visited: u64 },
    /// The scan ran to completion
    Completed { summary: ScanSummary },
}

/// Progress counters, emitted once per fetched batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanProgress {
    /// Shard currently being traversed
    pub shard: String,
    /// Keys visited so far, across all shards
    pub keys_visited: u64,
    /// Big keys found so far
    pub big_keys_found: usize,
    /// Keys skipped so far due to per-key query failures
    pub keys_skipped: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_are_serializable() {
        let event = ScanEvent::Progress(ScanProgress {
            shard: "127.0.0.1:6379".to_string(),
            keys_visited: 1500,
            big_keys_found: 3,
            keys_skipped: 1,
        });

        let json = serde_json::to_string(&event).unwrap();
        let deserialized: ScanEvent = serde_json::from_str(&json).unwrap();

        match deserialized {
            ScanEvent::Progress(p) => assert_eq!(p.keys_visited, 1500),
            _ => panic!("Wrong event type"),
        }
    }
}
