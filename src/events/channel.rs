//! Event channel implementation using crossbeam-channel.
//!
//! Lets the scanner report progress to the CLI (or any other frontend)
//! without blocking on it.

use crossbeam_channel::{bounded, unbounded, Receiver, Sender};

use super::ScanEvent;

/// Sends scan events from the core library.
///
/// A thin wrapper around crossbeam's Sender that can be cloned and sent
/// across threads.
#[derive(Clone)]
pub struct EventSender {
    inner: Sender<ScanEvent>,
}

impl EventSender {
    /// Send an event.
    ///
    /// If the receiver is dropped, the event is silently discarded.
    /// This keeps progress reporting optional.
    pub fn send(&self, event: ScanEvent) {
        let _ = self.inner.send(event);
    }
}

/// Receives scan events. Used by frontends to drive progress display.
pub struct EventReceiver {
    inner: Receiver<ScanEvent>,
}

impl EventReceiver {
    /// Block until the next event is received
    pub fn recv(&self) -> Option<ScanEvent> {
        self.inner.recv().ok()
    }

    /// Try to receive an event without blocking
    pub fn try_recv(&self) -> Option<ScanEvent> {
        self.inner.try_recv().ok()
    }

    /// Returns an iterator over received events
    pub fn iter(&self) -> impl Iterator<Item = ScanEvent> + '_ {
        self.inner.iter()
    }
}

/// Factory for event channel endpoints.
pub struct EventChannel;

impl EventChannel {
    /// Create a new unbounded event channel.
    pub fn new() -> (EventSender, EventReceiver) {
        let (sender, receiver) = unbounded();
        (
            EventSender { inner: sender },
            EventReceiver { inner: receiver },
        )
    }

    /// Create a bounded event channel with the specified capacity.
    pub fn bounded(capacity: usize) -> (EventSender, EventReceiver) {
        let (sender, receiver) = bounded(capacity);
        (
            EventSender { inner: sender },
            EventReceiver { inner: receiver },
        )
    }
}

/// A no-op event sender for callers that don't need progress reporting.
pub fn null_sender() -> EventSender {
    let (sender, _receiver) = EventChannel::new();
    sender
}
