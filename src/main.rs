//! # redis-bigkeys CLI
//!
//! Command-line interface for the big key finder.
//!
//! ## Usage
//! ```bash
//! redis-bigkeys --host 10.0.0.5 --password secret
//! redis-bigkeys --host 10.0.0.5 --cluster --threshold 1048576 --output json
//! ```

mod cli;

use redis_bigkeys::Result;

fn main() -> Result<()> {
    cli::run()
}
