//! Reconfiguration signal
//!
//! After an immediate update the network must reload configuration before
//! the next transaction. The governor raises the signal through the
//! `Reconfigurator` trait; `ChannelReconfigurator` broadcasts it to
//! subscribers over crossbeam channels.

use std::sync::atomic::{AtomicU64, Ordering};

use crossbeam::channel::{self, Receiver, Sender};
use parking_lot::Mutex;

/// Why the network is being reconfigured
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconfigReason {
    GasSchedule,
    StoragePricing,
}

/// One raised reconfiguration signal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconfigEvent {
    /// 1-based count of signals raised by this reconfigurator
    pub sequence: u64,
    pub reason: ReconfigReason,
}

/// Raises the network-wide reconfiguration signal
///
/// Called only after the triggering mutation is durable, so the signal
/// itself cannot fail the operation.
pub trait Reconfigurator: Send + Sync {
    fn reconfigure(&self, reason: ReconfigReason);
}

/// Broadcasts reconfiguration events to every live subscriber
#[derive(Debug, Default)]
pub struct ChannelReconfigurator {
    subscribers: Mutex<Vec<Sender<ReconfigEvent>>>,
    sequence: AtomicU64,
}

impl ChannelReconfigurator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Receive every event raised from now on
    pub fn subscribe(&self) -> Receiver<ReconfigEvent> {
        let (tx, rx) = channel::unbounded();
        self.subscribers.lock().push(tx);
        rx
    }

    /// Number of signals raised so far
    pub fn raised(&self) -> u64 {
        self.sequence.load(Ordering::SeqCst)
    }
}

impl Reconfigurator for ChannelReconfigurator {
    fn reconfigure(&self, reason: ReconfigReason) {
        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        let event = ReconfigEvent { sequence, reason };

        let mut subscribers = self.subscribers.lock();
        subscribers.retain(|tx| tx.send(event).is_ok());

        tracing::info!(
            "Reconfiguration #{} raised ({:?}), {} subscriber(s)",
            sequence,
            reason,
            subscribers.len()
        );
    }
}
