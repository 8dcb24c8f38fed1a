//! Journal Writer
//!
//! Handles appending entries to the journal file.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::config::SyncStrategy;
use crate::error::{Result, ScheduleError};
use crate::store::StateOp;

use super::{JournalEntry, JournalRecovery};

/// Writes entries to the journal file
pub struct JournalWriter {
    /// Journal file path
    path: PathBuf,

    /// Open file handle (append position tracked in `len`)
    file: File,

    /// Length of the committed prefix
    len: u64,

    /// LSN of the last appended entry
    current_lsn: u64,

    /// When to fsync
    sync_strategy: SyncStrategy,

    /// Entries appended since the last fsync
    unsynced: usize,
}

impl JournalWriter {
    /// Open or create a journal file
    ///
    /// The file must already be recovered; the writer continues after the
    /// last valid LSN it finds.
    pub fn open(path: &Path, sync_strategy: SyncStrategy) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(path)?;

        let scan = JournalRecovery::verify(path)?;
        if scan.was_truncated {
            return Err(ScheduleError::JournalCorruption(format!(
                "{} has an invalid tail after lsn {}; run recovery first",
                path.display(),
                scan.last_lsn
            )));
        }

        Ok(Self {
            path: path.to_path_buf(),
            file,
            len: scan.valid_len,
            current_lsn: scan.last_lsn,
            sync_strategy,
            unsynced: 0,
        })
    }

    /// Create a fresh, empty journal, replacing any existing file
    pub fn create(path: &Path, sync_strategy: SyncStrategy) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(true)
            .open(path)?;

        Ok(Self {
            path: path.to_path_buf(),
            file,
            len: 0,
            current_lsn: 0,
            sync_strategy,
            unsynced: 0,
        })
    }

    /// Append a batch as one entry, returning its LSN
    ///
    /// On failure the file is cut back to its previous length so a failed
    /// append never leaves a partial entry behind.
    pub fn append(&mut self, ops: Vec<StateOp>) -> Result<u64> {
        let lsn = self.current_lsn + 1;
        let bytes = JournalEntry::new(lsn, ops).serialize()?;

        if let Err(e) = self.write_and_maybe_sync(&bytes) {
            if let Err(rollback) = self.file.set_len(self.len) {
                tracing::error!(
                    "Journal {}: failed to roll back partial append: {}",
                    self.path.display(),
                    rollback
                );
            }
            return Err(ScheduleError::JournalWrite(format!("lsn {}: {}", lsn, e)));
        }

        self.len += bytes.len() as u64;
        self.current_lsn = lsn;
        Ok(lsn)
    }

    fn write_and_maybe_sync(&mut self, bytes: &[u8]) -> Result<()> {
        self.file.write_all(bytes)?;
        self.file.flush()?;
        self.unsynced += 1;

        let due = match self.sync_strategy {
            SyncStrategy::EveryWrite => true,
            SyncStrategy::EveryNEntries { count } => self.unsynced >= count,
        };
        if due {
            self.sync()?;
        }
        Ok(())
    }

    /// Force sync to disk
    pub fn sync(&mut self) -> Result<()> {
        self.file.sync_data()?;
        self.unsynced = 0;
        Ok(())
    }

    /// Get the current LSN
    pub fn current_lsn(&self) -> u64 {
        self.current_lsn
    }

    /// Entries appended since the last fsync
    pub fn unsynced(&self) -> usize {
        self.unsynced
    }

    /// Length of the journal in bytes
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
