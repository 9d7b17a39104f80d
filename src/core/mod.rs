//! # Core Module
//!
//! The frontend-agnostic big key detection engine.
//!
//! ## Modules
//! - `classifier` - threshold verdicts and type-dispatched member counts
//! - `client` - store-facing capability set (Redis standalone/cluster, in-memory)
//! - `scanner` - cursor-driven keyspace traversal
//! - `reporter` - result records and report sinks

pub mod classifier;
pub mod client;
pub mod reporter;
pub mod scanner;

// Re-export commonly used types
pub use classifier::{KeyType, MemberCount};
pub use client::{KeyspaceClient, Topology};
pub use reporter::{BigKeyRecord, ScanKey, ScanSummary};
pub use scanner::{BigKeyScanner, CancelToken, ScanConfig};
