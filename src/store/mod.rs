//! Store Module
//!
//! Storage seams for the governor.
//!
//! ## Responsibilities
//! - `ConfigStore`: the single gas schedule record (legacy or versioned)
//! - `PendingStore`: staged candidates for the next epoch, one per type tag
//! - `PricingStore`: the storage pricing record
//!
//! Both backends implement all three traits over one `LedgerState`:
//! - `MemoryStore`: state behind a `RwLock`, nothing persisted
//! - `JournaledStore`: same state, every batch journaled before it is visible
//!
//! Every mutation is a batch of `StateOp`s applied to a copy of the state,
//! checked, and only then swapped in.

mod state;
mod memory;
mod journaled;

pub use state::{LedgerState, StateOp};
pub use memory::MemoryStore;
pub use journaled::JournaledStore;

use bytes::Bytes;

use crate::error::Result;
use crate::pricing::StoragePricing;
use crate::schedule::{RecordKind, StoredRecord};

/// A single change to the gas schedule record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOp {
    Put(StoredRecord),
    Remove(RecordKind),
}

impl From<RecordOp> for StateOp {
    fn from(op: RecordOp) -> Self {
        match op {
            RecordOp::Put(record) => StateOp::PutRecord(record),
            RecordOp::Remove(kind) => StateOp::RemoveRecord(kind),
        }
    }
}

/// Holds the gas schedule record
pub trait ConfigStore: Send + Sync {
    /// Read the record of the given kind
    fn get(&self, kind: RecordKind) -> Result<Option<StoredRecord>>;

    /// Apply all operations atomically, or none of them
    ///
    /// Fails without changing anything if the result would hold both a
    /// legacy and a versioned record.
    fn commit(&self, ops: Vec<RecordOp>) -> Result<()>;

    fn exists(&self, kind: RecordKind) -> Result<bool> {
        Ok(self.get(kind)?.is_some())
    }

    fn put(&self, record: StoredRecord) -> Result<()> {
        self.commit(vec![RecordOp::Put(record)])
    }

    fn remove(&self, kind: RecordKind) -> Result<()> {
        self.commit(vec![RecordOp::Remove(kind)])
    }
}

/// Pending-configuration area keyed by type tag
pub trait PendingStore: Send + Sync {
    /// Stage a payload, replacing any earlier payload under the same tag
    fn stage(&self, tag: &str, payload: Bytes) -> Result<()>;

    /// Read the staged payload without removing it
    fn staged(&self, tag: &str) -> Result<Option<Bytes>>;

    /// Drop the staged payload, if any
    fn clear(&self, tag: &str) -> Result<()>;
}

/// Owner of the storage pricing record
pub trait PricingStore: Send + Sync {
    fn set_pricing(&self, pricing: StoragePricing) -> Result<()>;

    fn pricing(&self) -> Result<Option<StoragePricing>>;
}

/// One backend holding the record, the pending area and pricing
pub trait StateStore: ConfigStore + PendingStore + PricingStore {
    /// Apply `ops` and drop the pending payload under `tag` as one batch
    fn commit_and_clear(&self, ops: Vec<RecordOp>, tag: &str) -> Result<()>;
}

/// Record ops followed by removal of a pending tag
fn with_cleared(ops: Vec<RecordOp>, tag: &str) -> Vec<StateOp> {
    let mut batch: Vec<StateOp> = ops.into_iter().map(StateOp::from).collect();
    batch.push(StateOp::RemovePending {
        tag: tag.to_string(),
    });
    batch
}
