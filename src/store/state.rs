//! Ledger state shared by the store backends

use std::collections::BTreeMap;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ScheduleError};
use crate::pricing::StoragePricing;
use crate::schedule::{LegacyConfig, RecordKind, StoredRecord, VersionedConfig};

/// A single state mutation, as journaled
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StateOp {
    PutRecord(StoredRecord),
    RemoveRecord(RecordKind),
    PutPending { tag: String, payload: Vec<u8> },
    RemovePending { tag: String },
    PutPricing(StoragePricing),
}

/// Everything the governor persists
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerState {
    pub legacy: Option<LegacyConfig>,
    pub versioned: Option<VersionedConfig>,
    pub pending: BTreeMap<String, Bytes>,
    pub pricing: Option<StoragePricing>,
}

impl LedgerState {
    pub fn record(&self, kind: RecordKind) -> Option<StoredRecord> {
        match kind {
            RecordKind::Legacy => self.legacy.clone().map(StoredRecord::Legacy),
            RecordKind::Versioned => self.versioned.clone().map(StoredRecord::Versioned),
        }
    }

    /// Apply a batch to a copy of this state and return the copy
    ///
    /// `self` is never modified, so a rejected batch leaves no trace.
    pub fn apply_batch(&self, ops: &[StateOp]) -> Result<LedgerState> {
        let mut next = self.clone();
        for op in ops {
            next.apply(op);
        }

        if next.legacy.is_some() && next.versioned.is_some() {
            return Err(ScheduleError::Storage(
                "legacy and versioned gas schedules would coexist".to_string(),
            ));
        }
        Ok(next)
    }

    fn apply(&mut self, op: &StateOp) {
        match op {
            StateOp::PutRecord(StoredRecord::Legacy(legacy)) => self.legacy = Some(legacy.clone()),
            StateOp::PutRecord(StoredRecord::Versioned(versioned)) => {
                self.versioned = Some(versioned.clone())
            }
            StateOp::RemoveRecord(RecordKind::Legacy) => self.legacy = None,
            StateOp::RemoveRecord(RecordKind::Versioned) => self.versioned = None,
            StateOp::PutPending { tag, payload } => {
                self.pending
                    .insert(tag.clone(), Bytes::copy_from_slice(payload));
            }
            StateOp::RemovePending { tag } => {
                self.pending.remove(tag);
            }
            StateOp::PutPricing(pricing) => self.pricing = Some(pricing.clone()),
        }
    }

    /// Operations that rebuild this state from empty
    pub fn snapshot_ops(&self) -> Vec<StateOp> {
        let mut ops = Vec::new();
        if let Some(legacy) = &self.legacy {
            ops.push(StateOp::PutRecord(StoredRecord::Legacy(legacy.clone())));
        }
        if let Some(versioned) = &self.versioned {
            ops.push(StateOp::PutRecord(StoredRecord::Versioned(versioned.clone())));
        }
        for (tag, payload) in &self.pending {
            ops.push(StateOp::PutPending {
                tag: tag.clone(),
                payload: payload.to_vec(),
            });
        }
        if let Some(pricing) = &self.pricing {
            ops.push(StateOp::PutPricing(pricing.clone()));
        }
        ops
    }
}
