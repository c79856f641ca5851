//! Change notification emitters.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};

use tracing::debug;

use crate::core::ChangeNotifier;

/// The "stash tree changed" signal. It carries no description of the change.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ChangeSignal;

/// Delivers change signals over a channel to a listing consumer.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: Sender<ChangeSignal>,
}

impl ChannelNotifier {
    /// Returns the notifier and the receiving end for the consumer.
    pub fn new() -> (Self, Receiver<ChangeSignal>) {
        let (tx, rx) = mpsc::channel();
        (Self { tx }, rx)
    }
}

impl ChangeNotifier for ChannelNotifier {
    fn list_changed(&self) {
        if self.tx.send(ChangeSignal).is_err() {
            debug!("change signal dropped: consumer disconnected");
        }
    }
}

/// Counts change signals. Clones share the same counter.
#[derive(Debug, Clone, Default)]
pub struct CountingNotifier {
    count: Arc<AtomicUsize>,
}

impl CountingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of signals fired so far.
    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

impl ChangeNotifier for CountingNotifier {
    fn list_changed(&self) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }
}
