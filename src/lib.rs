//! # redis-bigkeys
//!
//! Finds the keys in a Redis keyspace whose memory footprint exceeds a
//! threshold, reporting each offender's identifier, type, byte size and
//! member count. Works against standalone servers and clusters.
//!
//! ## Design
//! - **Never blocks the store** - incremental SCAN batches, one request
//!   in flight at a time
//! - **Never mutates** - the tool only reads; no deletes, no expiry
//! - **Best-effort coverage** - a key that fails a query is skipped with
//!   a warning, never aborting the scan
//!
//! ## Architecture
//! The library is split into a core engine (frontend-agnostic) and thin
//! presentation layers:
//! - `core` - classification and keyspace traversal
//! - `events` - progress reporting over channels
//! - `error` - operator-friendly error types
//! - `cli` - command-line interface (binary only)

pub mod core;
pub mod error;
pub mod events;

// Re-export commonly used types at the crate root
pub use error::{BigKeyError, Result};

/// Initialize tracing for the library.
///
/// Called by the application entry point. Respects `RUST_LOG`.
pub fn init_tracing() {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set global default tracing subscriber");
}
