//! # Reporter Module
//!
//! Result records for qualifying keys and the sinks they are appended to.
//!
//! Key identifiers come off the wire as raw bytes and are not guaranteed
//! to be valid text. [`ScanKey`] keeps the bytes and renders a display
//! form on demand, falling back to an escaped representation when the
//! bytes are not UTF-8 - a malformed key never aborts a scan.

mod sink;

pub use sink::{CollectingSink, JsonLinesSink, ReportSink, TeeSink};

use crate::core::classifier::{KeyType, MemberCount};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A key identifier as returned by the store: opaque bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub struct ScanKey(Vec<u8>);

impl ScanKey {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Best-effort text rendering.
    ///
    /// Valid UTF-8 passes through unchanged; anything else is escaped
    /// byte-by-byte (`\xNN` for non-printable bytes) so every key has a
    /// printable form.
    pub fn render(&self) -> String {
        match std::str::from_utf8(&self.0) {
            Ok(text) => text.to_string(),
            Err(_) => self
                .0
                .iter()
                .flat_map(|b| std::ascii::escape_default(*b))
                .map(char::from)
                .collect(),
        }
    }
}

impl From<ScanKey> for String {
    fn from(key: ScanKey) -> Self {
        key.render()
    }
}

impl From<String> for ScanKey {
    fn from(text: String) -> Self {
        Self(text.into_bytes())
    }
}

impl fmt::Display for ScanKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render())
    }
}

/// One qualifying key: the unit of output of a scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BigKeyRecord {
    /// Key identifier (rendered best-effort when serialized)
    pub key: ScanKey,
    /// Value type as reported by TYPE
    pub key_type: KeyType,
    /// Approximate memory footprint from MEMORY USAGE, in bytes
    pub size_bytes: u64,
    /// Member count, or N/A for types without a defined cardinality
    pub member_count: MemberCount,
}

impl fmt::Display for BigKeyRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "key={} type={} size={} bytes members={}",
            self.key, self.key_type, self.size_bytes, self.member_count
        )
    }
}

/// End-of-scan summary, emitted once per run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanSummary {
    /// Number of shards traversed (1 for standalone)
    pub shards: usize,
    /// Total keys visited across all shards
    pub keys_visited: u64,
    /// Keys that exceeded the threshold
    pub big_keys_found: usize,
    /// Keys skipped because a per-key query failed
    pub keys_skipped: u64,
    /// True when the scan was interrupted before cursor completion
    pub cancelled: bool,
    /// When the scan started
    pub started_at: DateTime<Utc>,
    /// Wall-clock duration in milliseconds
    pub duration_ms: u64,
}
