//! Journal Module
//!
//! Durable, append-only log of committed state batches.
//!
//! ## Responsibilities
//! - Append one entry per committed batch, before the batch becomes visible
//! - CRC32 checksums for corruption detection
//! - Log Sequence Numbers (LSN) for ordering
//! - Crash recovery and replay
//!
//! A batch is the unit of atomicity: on recovery either every operation of
//! an entry is replayed or none is.
//!
//! ## File Format
//! ```text
//! ┌─────────────────────────────────────────┐
//! │ Entry 1                                 │
//! │ ┌─────────┬─────────┬────────┬────────┐ │
//! │ │ LSN (8) │ CRC (4) │Len (4) │ Data   │ │
//! │ └─────────┴─────────┴────────┴────────┘ │
//! ├─────────────────────────────────────────┤
//! │ Entry 2                                 │
//! │ ┌─────────┬─────────┬────────┬────────┐ │
//! │ │ LSN (8) │ CRC (4) │Len (4) │ Data   │ │
//! │ └─────────┴─────────┴────────┴────────┘ │
//! └─────────────────────────────────────────┘
//! ```

mod entry;
mod writer;
mod reader;
mod recovery;

pub use entry::{JournalEntry, HEADER_SIZE, MAX_ENTRY_SIZE};
pub use writer::JournalWriter;
pub use reader::{JournalReader, ReadOutcome};
pub use recovery::{JournalRecovery, RecoveryResult};
