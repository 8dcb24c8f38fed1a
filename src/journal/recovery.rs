//! Journal Recovery
//!
//! Handles crash recovery by replaying the journal.

use std::fs::OpenOptions;
use std::path::Path;

use crate::error::Result;

use super::{JournalEntry, JournalReader, ReadOutcome};

/// Handles journal recovery after a crash
pub struct JournalRecovery;

/// Result of a recovery operation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecoveryResult {
    /// Number of entries successfully recovered
    pub entries_recovered: u64,

    /// Number of corrupted entries found (recovery stops at the first)
    pub entries_corrupted: u64,

    /// Last valid LSN
    pub last_lsn: u64,

    /// Whether the journal was (or, for `verify`, would be) truncated
    pub was_truncated: bool,

    /// Length of the valid prefix in bytes
    pub valid_len: u64,
}

impl JournalRecovery {
    /// Recover entries from a journal file
    ///
    /// This will:
    /// 1. Read all valid entries in LSN order
    /// 2. Stop at the first torn or corrupted entry
    /// 3. Truncate the file to the valid prefix
    /// 4. Return the valid entries
    pub fn recover(path: &Path) -> Result<(Vec<JournalEntry>, RecoveryResult)> {
        let (entries, result) = Self::scan(path)?;

        if result.was_truncated {
            tracing::warn!(
                "Journal {}: truncating to {} bytes after lsn {}",
                path.display(),
                result.valid_len,
                result.last_lsn
            );
            let file = OpenOptions::new().write(true).open(path)?;
            file.set_len(result.valid_len)?;
            file.sync_all()?;
        }

        Ok((entries, result))
    }

    /// Verify integrity of a journal file without modifying it
    pub fn verify(path: &Path) -> Result<RecoveryResult> {
        let (_, result) = Self::scan(path)?;
        Ok(result)
    }

    fn scan(path: &Path) -> Result<(Vec<JournalEntry>, RecoveryResult)> {
        let mut reader = JournalReader::open(path)?;
        let mut entries = Vec::new();
        let mut result = RecoveryResult::default();

        loop {
            match reader.next_entry()? {
                ReadOutcome::Entry(entry) => {
                    result.entries_recovered += 1;
                    result.last_lsn = entry.lsn;
                    entries.push(entry);
                }
                ReadOutcome::End => break,
                ReadOutcome::Torn { offset } => {
                    tracing::debug!("Journal {}: torn entry at offset {}", path.display(), offset);
                    result.was_truncated = true;
                    break;
                }
                ReadOutcome::Corrupt { offset, reason } => {
                    tracing::warn!(
                        "Journal {}: corrupt entry at offset {}: {}",
                        path.display(),
                        offset,
                        reason
                    );
                    result.entries_corrupted += 1;
                    result.was_truncated = true;
                    break;
                }
            }
        }

        result.valid_len = reader.position();
        Ok((entries, result))
    }
}
