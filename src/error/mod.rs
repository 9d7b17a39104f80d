//! # Error Module
//!
//! Error types for the big key finder.
//!
//! ## Design Principles
//! - **Fatal vs. recoverable** - losing a shard kills the scan, losing one
//!   key never does
//! - **Include context** - server addresses, shard names, key renderings
//! - **Operator-friendly messages** - suggest the fix when we know it

use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum BigKeyError {
    #[error("Connection error: {0}")]
    Connect(#[from] ConnectError),

    #[error("Scan error: {0}")]
    Scan(#[from] ScanError),

    #[error("Report error: {0}")]
    Report(#[from] ReportError),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Errors establishing or qualifying the store connection
#[derive(Error, Debug)]
pub enum ConnectError {
    #[error("Failed to connect to Redis at {addr}: {source}")]
    Unreachable {
        addr: String,
        #[source]
        source: redis::RedisError,
    },

    #[error("Failed to authenticate with Redis at {addr}. Check the password.")]
    AuthenticationFailed { addr: String },

    #[error("Redis version {version} does not support MEMORY USAGE (requires 4.0 or newer)")]
    UnsupportedVersion { version: String },

    #[error("Redis at {addr} is in cluster mode. Pass --cluster to scan it.")]
    ClusterRequired { addr: String },

    #[error("Redis at {addr} is a standalone server. Drop the --cluster flag.")]
    NotACluster { addr: String },

    #[error("Cluster discovery failed: {0}")]
    ClusterDiscovery(String),
}

/// Fatal errors during keyspace traversal.
///
/// Per-key query failures are not represented here - those are
/// [`ClientError`]s, contained within the per-key processing step.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Lost shard {shard} during scan: {source}")]
    ShardFailed {
        shard: String,
        #[source]
        source: ClientError,
    },
}

/// A single store query failed.
///
/// Raised by [`KeyspaceClient`](crate::core::client::KeyspaceClient)
/// implementations. Whether it is fatal depends on where it surfaces:
/// a failed SCAN batch aborts the shard, a failed per-key query only
/// skips that key.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error(transparent)]
    Redis(#[from] redis::RedisError),

    #[error("{0}")]
    Backend(String),
}

/// Errors writing to a report sink
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Failed to write report to {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize report record: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, BigKeyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connect_error_includes_address() {
        let error = ConnectError::AuthenticationFailed {
            addr: "10.0.0.5:6379".to_string(),
        };
        let message = error.to_string();
        assert!(message.contains("10.0.0.5:6379"));
        assert!(message.contains("password"));
    }

    #[test]
    fn topology_mismatch_suggests_flag() {
        let error = ConnectError::ClusterRequired {
            addr: "redis.internal:6379".to_string(),
        };
        assert!(error.to_string().contains("--cluster"));
    }

    #[test]
    fn scan_error_names_shard() {
        let error = ScanError::ShardFailed {
            shard: "10.0.0.5:7001".to_string(),
            source: ClientError::Backend("connection reset".to_string()),
        };
        let message = error.to_string();
        assert!(message.contains("10.0.0.5:7001"));
    }
}
