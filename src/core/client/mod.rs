//! # Client Module
//!
//! The store-facing capability set the scanner runs against.
//!
//! One trait covers both topologies: a standalone server is a keyspace
//! with exactly one shard, a cluster is one shard per master node. The
//! scanner addresses shards by index and never learns which topology it
//! is talking to; the classifier never sees shards at all.
//!
//! ## Implementations
//! - `redis` - standalone and cluster clients over the `redis` crate
//! - `memory` - in-memory keyspace for tests and offline runs

mod memory;
mod redis;

pub use memory::InMemoryKeyspace;
pub use redis::{connect, parse_cluster_nodes, ConnectOptions, RedisClusterClient, RedisStandaloneClient};

use crate::core::classifier::{CardinalityKind, KeyType};
use crate::error::ClientError;

/// Store topology, decided once at startup and injected into the scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topology {
    Standalone,
    Cluster,
}

/// One batch of keys from a shard's cursor sequence.
#[derive(Debug, Clone)]
pub struct KeyBatch {
    /// Cursor to resume from; zero means the shard is fully traversed
    pub next_cursor: u64,
    /// Keys in this batch. May hold more or fewer keys than the batch
    /// hint - the hint is advisory, only the cursor signals completion.
    pub keys: Vec<Vec<u8>>,
}

/// Capability set consumed by the scanner.
///
/// Methods take `&mut self`: the scan is strictly sequential with one
/// request in flight, so there is never a concurrent caller.
pub trait KeyspaceClient {
    /// Number of independently-scannable shards (1 for standalone)
    fn shard_count(&self) -> usize;

    /// Human-readable shard identifier, for logs and progress display
    fn shard_name(&self, shard: usize) -> String;

    /// Fetch the next batch of keys from a shard.
    ///
    /// `cursor` is zero to start and the previous batch's `next_cursor`
    /// to resume. A cursor must never be reused across shards or scans.
    fn scan_batch(
        &mut self,
        shard: usize,
        cursor: u64,
        count: usize,
    ) -> Result<KeyBatch, ClientError>;

    /// Approximate memory footprint of a key in bytes.
    ///
    /// `None` means the store cannot size this key (for Redis, a nil
    /// MEMORY USAGE reply - typically the key expired mid-scan).
    fn memory_usage(&mut self, shard: usize, key: &[u8]) -> Result<Option<u64>, ClientError>;

    /// Value type of a key
    fn key_type(&mut self, shard: usize, key: &[u8]) -> Result<KeyType, ClientError>;

    /// Cardinality of a composite-typed key
    fn cardinality(
        &mut self,
        shard: usize,
        key: &[u8],
        kind: CardinalityKind,
    ) -> Result<u64, ClientError>;
}
