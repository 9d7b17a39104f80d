//! # Scanner Module
//!
//! Drives the keyspace traversal: per-shard cursor loops, per-key size and
//! type queries, classification, and emission of qualifying records.
//!
//! The scan is strictly sequential - one batch, one key, one request in
//! flight - to bound the load placed on the store being inspected.
//!
//! ## Failure model
//! - A failed SCAN batch is fatal for the run (connectivity is gone)
//! - A failed per-key query skips that key and nothing else
//! - Cancellation is checked at batch boundaries; records already emitted
//!   stay valid
//!
//! ## Example
//! ```rust
//! use redis_bigkeys::core::classifier::KeyType;
//! use redis_bigkeys::core::client::InMemoryKeyspace;
//! use redis_bigkeys::core::reporter::CollectingSink;
//! use redis_bigkeys::core::scanner::{BigKeyScanner, ScanConfig};
//!
//! let mut keyspace = InMemoryKeyspace::standalone();
//! keyspace.insert(0, "big", KeyType::String, 20_000, 1);
//!
//! let scanner = BigKeyScanner::new(ScanConfig::default());
//! let mut sink = CollectingSink::new();
//! let summary = scanner.run(&mut keyspace, &mut sink).unwrap();
//! assert_eq!(summary.big_keys_found, 1);
//! ```

use crate::core::classifier;
use crate::core::client::KeyspaceClient;
use crate::core::reporter::{BigKeyRecord, ReportSink, ScanKey, ScanSummary};
use crate::error::{Result, ScanError};
use crate::events::{null_sender, EventSender, ScanEvent, ScanProgress};
use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Scan parameters, immutable for the run.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Keys strictly above this many bytes are reported
    pub threshold_bytes: u64,
    /// COUNT hint passed to the store per batch. Advisory: the store may
    /// return more or fewer keys
    pub batch_hint: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            threshold_bytes: 10 * 1024,
            batch_hint: 1000,
        }
    }
}

/// Cooperative cancellation handle.
///
/// Clone it, hand one side to a signal handler, pass the other to the
/// scanner. The scanner polls it between batches, so cancellation never
/// tears a batch in half.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Outcome of processing one key.
enum KeyOutcome {
    Big,
    UnderThreshold,
    Skipped,
}

/// Walks every shard of a keyspace and reports the keys whose memory
/// footprint strictly exceeds the configured threshold.
pub struct BigKeyScanner {
    config: ScanConfig,
    cancel: CancelToken,
}

impl BigKeyScanner {
    pub fn new(config: ScanConfig) -> Self {
        Self {
            config,
            cancel: CancelToken::new(),
        }
    }

    /// Use an externally-owned cancellation token (e.g. one wired to
    /// SIGINT by the CLI).
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    /// Run without progress events.
    pub fn run(
        &self,
        client: &mut dyn KeyspaceClient,
        sink: &mut dyn ReportSink,
    ) -> Result<ScanSummary> {
        self.run_with_events(client, sink, &null_sender())
    }

    /// Run the full scan: every shard, cursor to completion.
    ///
    /// Qualifying records go to `sink` as they are found; lifecycle and
    /// progress go to `events`. Returns the end-of-scan summary, which is
    /// also handed to `sink.finish`.
    pub fn run_with_events(
        &self,
        client: &mut dyn KeyspaceClient,
        sink: &mut dyn ReportSink,
        events: &EventSender,
    ) -> Result<ScanSummary> {
        let started_at = Utc::now();
        let start = Instant::now();

        let shards = client.shard_count();
        events.send(ScanEvent::Started { shards });

        let mut keys_visited = 0u64;
        let mut keys_skipped = 0u64;
        let mut big_keys_found = 0usize;
        let mut cancelled = false;

        'shards: for shard in 0..shards {
            let shard_name = client.shard_name(shard);
            debug!(shard = %shard_name, "starting shard scan");
            events.send(ScanEvent::ShardStarted {
                shard: shard_name.clone(),
            });

            let shard_start = keys_visited;
            let mut cursor = 0u64;

            loop {
                if self.cancel.is_cancelled() {
                    warn!(keys_visited, "scan cancelled by operator");
                    events.send(ScanEvent::Cancelled { keys_visited });
                    cancelled = true;
                    break 'shards;
                }

                let batch = client
                    .scan_batch(shard, cursor, self.config.batch_hint)
                    .map_err(|source| ScanError::ShardFailed {
                        shard: shard_name.clone(),
                        source,
                    })?;

                for key in &batch.keys {
                    keys_visited += 1;
                    match self.process_key(client, shard, key, sink, events)? {
                        KeyOutcome::Big => big_keys_found += 1,
                        KeyOutcome::Skipped => keys_skipped += 1,
                        KeyOutcome::UnderThreshold => {}
                    }
                }

                events.send(ScanEvent::Progress(ScanProgress {
                    shard: shard_name.clone(),
                    keys_visited,
                    big_keys_found,
                    keys_skipped,
                }));

                // The shard is done exactly when the cursor comes back to
                // the zero sentinel
                cursor = batch.next_cursor;
                if cursor == 0 {
                    break;
                }
            }

            debug!(shard = %shard_name, keys = keys_visited - shard_start, "shard scan complete");
            events.send(ScanEvent::ShardCompleted {
                shard: shard_name,
                keys_visited: keys_visited - shard_start,
            });
        }

        let summary = ScanSummary {
            shards,
            keys_visited,
            big_keys_found,
            keys_skipped,
            cancelled,
            started_at,
            duration_ms: start.elapsed().as_millis() as u64,
        };

        if !cancelled {
            events.send(ScanEvent::Completed {
                summary: summary.clone(),
            });
        }
        sink.finish(&summary)?;
        Ok(summary)
    }

    /// Size, classify, and possibly report one key.
    ///
    /// Every store failure in here is contained: the key is skipped with
    /// a warning and the shard scan moves on. Only sink failures escape.
    fn process_key(
        &self,
        client: &mut dyn KeyspaceClient,
        shard: usize,
        key: &[u8],
        sink: &mut dyn ReportSink,
        events: &EventSender,
    ) -> Result<KeyOutcome> {
        let scan_key = ScanKey::new(key);

        let size_bytes = match client.memory_usage(shard, key) {
            Ok(Some(size)) => size,
            Ok(None) => {
                skip(events, &scan_key, "size unavailable (key may have expired)");
                return Ok(KeyOutcome::Skipped);
            }
            Err(e) => {
                skip(events, &scan_key, &format!("size query failed: {}", e));
                return Ok(KeyOutcome::Skipped);
            }
        };

        if !classifier::is_big(size_bytes, self.config.threshold_bytes) {
            return Ok(KeyOutcome::UnderThreshold);
        }

        let key_type = match client.key_type(shard, key) {
            Ok(key_type) => key_type,
            Err(e) => {
                skip(events, &scan_key, &format!("type query failed: {}", e));
                return Ok(KeyOutcome::Skipped);
            }
        };

        let member_count =
            match classifier::member_count(key_type, |kind| client.cardinality(shard, key, kind)) {
                Ok(count) => count,
                Err(e) => {
                    skip(events, &scan_key, &format!("cardinality query failed: {}", e));
                    return Ok(KeyOutcome::Skipped);
                }
            };

        let record = BigKeyRecord {
            key: scan_key,
            key_type,
            size_bytes,
            member_count,
        };
        info!(%record, "big key found");
        events.send(ScanEvent::BigKeyFound {
            record: record.clone(),
        });
        sink.append(&record)?;
        Ok(KeyOutcome::Big)
    }
}

fn skip(events: &EventSender, key: &ScanKey, reason: &str) {
    warn!(key = %key, reason, "skipping key");
    events.send(ScanEvent::KeySkipped {
        key: key.render(),
        reason: reason.to_string(),
    });
}
