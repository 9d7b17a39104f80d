//! In-memory keyspace implementation.
//!
//! A deterministic multi-shard keyspace backing scanner tests, with
//! failure injection for the per-key skip paths. Cursor semantics match
//! the real store: opaque position, batch hint advisory, zero cursor
//! after at least one batch means done.

use super::{KeyBatch, KeyspaceClient};
use crate::core::classifier::{CardinalityKind, KeyType};
use crate::error::ClientError;

/// One key in the fixture keyspace.
#[derive(Debug, Clone)]
struct MemoryEntry {
    key: Vec<u8>,
    key_type: KeyType,
    /// `None` models a nil MEMORY USAGE reply
    size_bytes: Option<u64>,
    members: u64,
    /// When set, every per-key query on this key fails
    poisoned: bool,
}

#[derive(Debug, Clone, Default)]
struct MemoryShard {
    name: String,
    entries: Vec<MemoryEntry>,
}

/// An in-memory multi-shard keyspace.
#[derive(Debug, Clone, Default)]
pub struct InMemoryKeyspace {
    shards: Vec<MemoryShard>,
}

impl InMemoryKeyspace {
    /// Single-shard keyspace (standalone topology)
    pub fn standalone() -> Self {
        Self::with_shards(1)
    }

    pub fn with_shards(count: usize) -> Self {
        let shards = (0..count)
            .map(|i| MemoryShard {
                name: format!("memory-{}", i),
                entries: Vec::new(),
            })
            .collect();
        Self { shards }
    }

    /// Add a key with a known size and member count.
    pub fn insert(
        &mut self,
        shard: usize,
        key: impl Into<Vec<u8>>,
        key_type: KeyType,
        size_bytes: u64,
        members: u64,
    ) -> &mut Self {
        self.shards[shard].entries.push(MemoryEntry {
            key: key.into(),
            key_type,
            size_bytes: Some(size_bytes),
            members,
            poisoned: false,
        });
        self
    }

    /// Add a key whose size query returns nil (store cannot size it).
    pub fn insert_unsized(
        &mut self,
        shard: usize,
        key: impl Into<Vec<u8>>,
        key_type: KeyType,
    ) -> &mut Self {
        self.shards[shard].entries.push(MemoryEntry {
            key: key.into(),
            key_type,
            size_bytes: None,
            members: 0,
            poisoned: false,
        });
        self
    }

    /// Make every per-key query on `key` fail, on whichever shard holds it.
    pub fn poison(&mut self, key: &[u8]) -> &mut Self {
        for shard in &mut self.shards {
            for entry in &mut shard.entries {
                if entry.key == key {
                    entry.poisoned = true;
                }
            }
        }
        self
    }

    fn entry(&self, shard: usize, key: &[u8]) -> Result<&MemoryEntry, ClientError> {
        let entry = self.shards[shard]
            .entries
            .iter()
            .find(|e| e.key == key)
            .ok_or_else(|| ClientError::Backend("no such key".to_string()))?;
        if entry.poisoned {
            return Err(ClientError::Backend("injected query failure".to_string()));
        }
        Ok(entry)
    }
}

impl KeyspaceClient for InMemoryKeyspace {
    fn shard_count(&self) -> usize {
        self.shards.len()
    }

    fn shard_name(&self, shard: usize) -> String {
        self.shards[shard].name.clone()
    }

    fn scan_batch(
        &mut self,
        shard: usize,
        cursor: u64,
        count: usize,
    ) -> Result<KeyBatch, ClientError> {
        let entries = &self.shards[shard].entries;
        let start = cursor as usize;
        let end = (start + count.max(1)).min(entries.len());

        let keys = entries[start..end].iter().map(|e| e.key.clone()).collect();
        let next_cursor = if end >= entries.len() { 0 } else { end as u64 };
        Ok(KeyBatch { next_cursor, keys })
    }

    fn memory_usage(&mut self, shard: usize, key: &[u8]) -> Result<Option<u64>, ClientError> {
        Ok(self.entry(shard, key)?.size_bytes)
    }

    fn key_type(&mut self, shard: usize, key: &[u8]) -> Result<KeyType, ClientError> {
        Ok(self.entry(shard, key)?.key_type)
    }

    fn cardinality(
        &mut self,
        shard: usize,
        key: &[u8],
        _kind: CardinalityKind,
    ) -> Result<u64, ClientError> {
        Ok(self.entry(shard, key)?.members)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keyspace_of(n: usize) -> InMemoryKeyspace {
        let mut keyspace = InMemoryKeyspace::standalone();
        for i in 0..n {
            keyspace.insert(0, format!("key:{}", i), KeyType::String, 100, 1);
        }
        keyspace
    }

    #[test]
    fn cursor_walks_the_whole_shard_exactly_once() {
        let mut keyspace = keyspace_of(10);

        let mut seen = Vec::new();
        let mut cursor = 0;
        loop {
            let batch = keyspace.scan_batch(0, cursor, 3).unwrap();
            seen.extend(batch.keys);
            cursor = batch.next_cursor;
            if cursor == 0 {
                break;
            }
        }

        assert_eq!(seen.len(), 10);
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), 10, "no key may be visited twice");
    }

    #[test]
    fn empty_shard_completes_on_first_batch() {
        let mut keyspace = InMemoryKeyspace::standalone();
        let batch = keyspace.scan_batch(0, 0, 100).unwrap();
        assert_eq!(batch.next_cursor, 0);
        assert!(batch.keys.is_empty());
    }

    #[test]
    fn poisoned_keys_fail_every_query() {
        let mut keyspace = InMemoryKeyspace::standalone();
        keyspace.insert(0, "bad", KeyType::Hash, 500, 5);
        keyspace.poison(b"bad");

        assert!(keyspace.memory_usage(0, b"bad").is_err());
        assert!(keyspace.key_type(0, b"bad").is_err());
        assert!(keyspace
            .cardinality(0, b"bad", CardinalityKind::HashFields)
            .is_err());
    }

    #[test]
    fn unsized_keys_report_none() {
        let mut keyspace = InMemoryKeyspace::standalone();
        keyspace.insert_unsized(0, "mystery", KeyType::Other);
        assert_eq!(keyspace.memory_usage(0, b"mystery").unwrap(), None);
    }
}
