//! Journaled store
//!
//! Durable store: every batch is appended to the journal before the new
//! state becomes visible, and the state is rebuilt from the journal on open.
//!
//! ## Lock Order
//! journal (Mutex) → state (RwLock write). Readers only take the state read
//! lock and never wait on journal I/O.

use std::fs;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use parking_lot::{Mutex, RwLock};

use crate::config::SyncStrategy;
use crate::error::{Result, ScheduleError};
use crate::journal::{JournalRecovery, JournalWriter, RecoveryResult};
use crate::pricing::StoragePricing;
use crate::schedule::{RecordKind, StoredRecord};

use super::{
    with_cleared, ConfigStore, LedgerState, PendingStore, PricingStore, RecordOp, StateOp,
    StateStore,
};

/// How far a batch must reach before `commit_ops` returns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Durability {
    /// Follow the configured sync strategy
    Strategy,

    /// Always fsync; used for batches that trigger a reconfiguration
    Synced,
}

/// Store backed by an append-only journal
pub struct JournaledStore {
    /// Directory holding the journal
    dir: PathBuf,

    /// Materialized state
    state: RwLock<LedgerState>,

    /// Journal writer (exclusive access needed)
    journal: Mutex<JournalWriter>,

    /// Sync strategy, kept for reopening after compaction
    sync_strategy: SyncStrategy,

    /// Outcome of the recovery performed on open
    recovery: RecoveryResult,
}

impl JournaledStore {
    // =========================================================================
    // Internal Path Constants
    // =========================================================================
    const JOURNAL_FILENAME: &'static str = "state.journal";
    const COMPACT_FILENAME: &'static str = "state.journal.compact";

    /// Open or create a store in the given directory
    ///
    /// On startup:
    /// 1. Create the directory if needed
    /// 2. Recover the journal (truncating a torn tail)
    /// 3. Replay every batch into a fresh state
    pub fn open(dir: &Path, sync_strategy: SyncStrategy) -> Result<Self> {
        fs::create_dir_all(dir)?;
        let path = dir.join(Self::JOURNAL_FILENAME);

        let mut state = LedgerState::default();
        let mut recovery = RecoveryResult::default();

        if path.exists() {
            let (entries, result) = JournalRecovery::recover(&path)?;
            for entry in &entries {
                state = state.apply_batch(&entry.ops).map_err(|e| {
                    ScheduleError::JournalCorruption(format!("replay of lsn {} failed: {}", entry.lsn, e))
                })?;
            }

            if result.entries_recovered > 0 || result.entries_corrupted > 0 {
                tracing::info!(
                    "Journal recovery: {} entries recovered, {} corrupted, last_lsn={}",
                    result.entries_recovered,
                    result.entries_corrupted,
                    result.last_lsn
                );
            }
            recovery = result;
        }

        let journal = JournalWriter::open(&path, sync_strategy)?;

        Ok(Self {
            dir: dir.to_path_buf(),
            state: RwLock::new(state),
            journal: Mutex::new(journal),
            sync_strategy,
            recovery,
        })
    }

    /// Journal a batch, then make it visible
    ///
    /// With `Durability::Synced` the journal is fsynced before returning,
    /// whatever the sync strategy, so callers may announce the change.
    fn commit_ops(&self, ops: Vec<StateOp>, durability: Durability) -> Result<()> {
        let mut journal = self.journal.lock();
        let mut state = self.state.write();

        let next = state.apply_batch(&ops)?;
        let lsn = journal.append(ops)?;
        // The entry is in the file and will replay on reopen, so the state
        // follows it even if the forced sync fails.
        *state = next;
        if durability == Durability::Synced && journal.unsynced() > 0 {
            journal.sync()?;
        }

        tracing::trace!("Committed batch at lsn {}", lsn);
        Ok(())
    }

    /// Rewrite the journal as a single snapshot entry
    ///
    /// The snapshot is written to a side file and renamed over the journal,
    /// so a crash leaves either the old or the new journal in place.
    pub fn compact(&self) -> Result<()> {
        let mut journal = self.journal.lock();
        let state = self.state.read();

        let path = self.journal_path();
        let tmp = self.dir.join(Self::COMPACT_FILENAME);
        let before = journal.len();

        {
            let mut compacted = JournalWriter::create(&tmp, SyncStrategy::EveryWrite)?;
            let ops = state.snapshot_ops();
            if !ops.is_empty() {
                compacted.append(ops)?;
            }
            compacted.sync()?;
        }
        fs::rename(&tmp, &path)?;

        *journal = JournalWriter::open(&path, self.sync_strategy)?;
        tracing::info!("Compacted journal from {} to {} bytes", before, journal.len());
        Ok(())
    }

    /// Force the journal to disk
    pub fn sync(&self) -> Result<()> {
        self.journal.lock().sync()
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> LedgerState {
        self.state.read().clone()
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    pub fn journal_path(&self) -> PathBuf {
        self.dir.join(Self::JOURNAL_FILENAME)
    }

    /// LSN of the last committed batch
    pub fn last_lsn(&self) -> u64 {
        self.journal.lock().current_lsn()
    }

    /// Entries appended but not yet fsynced
    pub fn unsynced_entries(&self) -> usize {
        self.journal.lock().unsynced()
    }

    /// What recovery found when this store was opened
    pub fn recovery(&self) -> &RecoveryResult {
        &self.recovery
    }
}

impl ConfigStore for JournaledStore {
    fn get(&self, kind: RecordKind) -> Result<Option<StoredRecord>> {
        Ok(self.state.read().record(kind))
    }

    fn commit(&self, ops: Vec<RecordOp>) -> Result<()> {
        self.commit_ops(
            ops.into_iter().map(StateOp::from).collect(),
            Durability::Synced,
        )
    }
}

impl PendingStore for JournaledStore {
    fn stage(&self, tag: &str, payload: Bytes) -> Result<()> {
        self.commit_ops(
            vec![StateOp::PutPending {
                tag: tag.to_string(),
                payload: payload.to_vec(),
            }],
            Durability::Strategy,
        )
    }

    fn staged(&self, tag: &str) -> Result<Option<Bytes>> {
        Ok(self.state.read().pending.get(tag).cloned())
    }

    fn clear(&self, tag: &str) -> Result<()> {
        if !self.state.read().pending.contains_key(tag) {
            return Ok(());
        }
        self.commit_ops(
            vec![StateOp::RemovePending {
                tag: tag.to_string(),
            }],
            Durability::Strategy,
        )
    }
}

impl PricingStore for JournaledStore {
    fn set_pricing(&self, pricing: StoragePricing) -> Result<()> {
        self.commit_ops(vec![StateOp::PutPricing(pricing)], Durability::Synced)
    }

    fn pricing(&self) -> Result<Option<StoragePricing>> {
        Ok(self.state.read().pricing.clone())
    }
}

impl StateStore for JournaledStore {
    fn commit_and_clear(&self, ops: Vec<RecordOp>, tag: &str) -> Result<()> {
        self.commit_ops(with_cleared(ops, tag), Durability::Synced)
    }
}
