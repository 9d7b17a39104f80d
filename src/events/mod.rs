//! # Events Module
//!
//! Progress reporting from the scan core to any frontend.
//!
//! The scanner pushes [`ScanEvent`]s into a channel as it works; the CLI
//! consumes them on another thread to drive its progress display. Frontends
//! that don't care pass [`null_sender`] and events are discarded.

mod channel;
mod types;

pub use channel::{null_sender, EventChannel, EventReceiver, EventSender};
pub use types::{ScanEvent, ScanProgress};
