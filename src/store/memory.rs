//! In-memory store
//!
//! Keeps `LedgerState` behind a `RwLock`. Used by tests and by embedders
//! that persist state elsewhere.

use bytes::Bytes;
use parking_lot::RwLock;

use crate::error::Result;
use crate::pricing::StoragePricing;
use crate::schedule::{RecordKind, StoredRecord};

use super::{
    with_cleared, ConfigStore, LedgerState, PendingStore, PricingStore, RecordOp, StateOp,
    StateStore,
};

/// Volatile store for all governor state
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<LedgerState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing state (e.g. a genesis snapshot)
    pub fn with_state(state: LedgerState) -> Self {
        Self {
            state: RwLock::new(state),
        }
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> LedgerState {
        self.state.read().clone()
    }

    fn commit_ops(&self, ops: &[StateOp]) -> Result<()> {
        let mut state = self.state.write();
        let next = state.apply_batch(ops)?;
        *state = next;
        Ok(())
    }
}

impl ConfigStore for MemoryStore {
    fn get(&self, kind: RecordKind) -> Result<Option<StoredRecord>> {
        Ok(self.state.read().record(kind))
    }

    fn commit(&self, ops: Vec<RecordOp>) -> Result<()> {
        let ops: Vec<StateOp> = ops.into_iter().map(StateOp::from).collect();
        self.commit_ops(&ops)
    }
}

impl PendingStore for MemoryStore {
    fn stage(&self, tag: &str, payload: Bytes) -> Result<()> {
        self.commit_ops(&[StateOp::PutPending {
            tag: tag.to_string(),
            payload: payload.to_vec(),
        }])
    }

    fn staged(&self, tag: &str) -> Result<Option<Bytes>> {
        Ok(self.state.read().pending.get(tag).cloned())
    }

    fn clear(&self, tag: &str) -> Result<()> {
        self.commit_ops(&[StateOp::RemovePending {
            tag: tag.to_string(),
        }])
    }
}

impl PricingStore for MemoryStore {
    fn set_pricing(&self, pricing: StoragePricing) -> Result<()> {
        self.commit_ops(&[StateOp::PutPricing(pricing)])
    }

    fn pricing(&self) -> Result<Option<StoragePricing>> {
        Ok(self.state.read().pricing.clone())
    }
}

impl StateStore for MemoryStore {
    fn commit_and_clear(&self, ops: Vec<RecordOp>, tag: &str) -> Result<()> {
        self.commit_ops(&with_cleared(ops, tag))
    }
}
