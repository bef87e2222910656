//! Replay-last broadcast channels for the output event streams.
//!
//! A `Signal` holds the latest published value and fans new values
//! out to any number of subscribers. Late subscribers immediately
//! receive the current value; beyond that there is no buffering on
//! the publisher side.

use std::sync::mpsc::{channel, Receiver, Sender};

/// Single-slot latest-value broadcast channel.
pub struct Signal<T: Clone> {
    latest: T,
    subscribers: Vec<Sender<T>>,
}

impl<T: Clone> Signal<T> {
    /// Create a signal holding an initial (default/quiescent) value.
    pub fn new(initial: T) -> Self {
        Self {
            latest: initial,
            subscribers: Vec::new(),
        }
    }

    /// The most recently published value.
    pub fn latest(&self) -> &T {
        &self.latest
    }

    /// Register a subscriber. The current value is delivered
    /// immediately (replay-last).
    pub fn subscribe(&mut self) -> Receiver<T> {
        let (tx, rx) = channel();
        // A send to a channel whose receiver is still held cannot fail.
        let _ = tx.send(self.latest.clone());
        self.subscribers.push(tx);
        rx
    }

    /// Publish a value: store it and broadcast to all live
    /// subscribers, pruning any whose receiver was dropped.
    pub fn publish(&mut self, value: T) {
        self.latest = value.clone();
        self.subscribers
            .retain(|tx| tx.send(value.clone()).is_ok());
    }

    /// Number of live subscribers (as of the last publish).
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

// ── Tests ──────────────────────────────────────────────────
