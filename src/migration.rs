//! Legacy migration
//!
//! The first versioned install on a network whose genesis wrote the legacy
//! format must drop the legacy record in the same batch, so storage never
//! holds both formats or neither.

use crate::error::Result;
use crate::schedule::{RecordKind, StoredRecord, VersionedConfig};
use crate::store::{ConfigStore, RecordOp};

/// Build the batch that installs `candidate`
pub fn plan_install(store: &dyn ConfigStore, candidate: VersionedConfig) -> Result<Vec<RecordOp>> {
    let mut ops = Vec::with_capacity(2);

    if store.exists(RecordKind::Legacy)? {
        tracing::info!(
            "Migrating legacy gas schedule to feature version {}",
            candidate.feature_version
        );
        ops.push(RecordOp::Remove(RecordKind::Legacy));
    }
    ops.push(RecordOp::Put(StoredRecord::Versioned(candidate)));

    Ok(ops)
}
