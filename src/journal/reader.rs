//! Journal Reader
//!
//! Handles reading entries from the journal file.

use std::fs::File;
use std::io::{BufReader, ErrorKind, Read};
use std::path::Path;

use crate::error::{Result, ScheduleError};

use super::{JournalEntry, HEADER_SIZE, MAX_ENTRY_SIZE};

/// What the reader found at the current position
#[derive(Debug)]
pub enum ReadOutcome {
    /// A complete, checksummed entry
    Entry(JournalEntry),

    /// Clean end of file
    End,

    /// The file ends in the middle of an entry (torn write)
    Torn { offset: u64 },

    /// A complete entry that fails validation
    Corrupt { offset: u64, reason: String },
}

/// Reads entries from the journal file, front to back
pub struct JournalReader {
    reader: BufReader<File>,
    position: u64,
    file_len: u64,
    last_lsn: u64,
}

impl JournalReader {
    /// Open a journal file for reading
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let file_len = file.metadata()?.len();

        Ok(Self {
            reader: BufReader::new(file),
            position: 0,
            file_len,
            last_lsn: 0,
        })
    }

    /// Byte offset of the next unread entry
    pub fn position(&self) -> u64 {
        self.position
    }

    /// LSN of the last entry returned
    pub fn last_lsn(&self) -> u64 {
        self.last_lsn
    }

    /// Read the next entry
    ///
    /// Never returns a torn or corrupt entry as `Entry`; after `Torn` or
    /// `Corrupt` the reader should not be used again.
    pub fn next_entry(&mut self) -> Result<ReadOutcome> {
        let offset = self.position;
        if offset == self.file_len {
            return Ok(ReadOutcome::End);
        }

        let mut header = [0u8; HEADER_SIZE];
        if !self.read_full(&mut header)? {
            return Ok(ReadOutcome::Torn { offset });
        }

        let (lsn, crc, len) = JournalEntry::parse_header(&header);
        if len > MAX_ENTRY_SIZE {
            return Ok(ReadOutcome::Corrupt {
                offset,
                reason: format!("entry length {} exceeds maximum {}", len, MAX_ENTRY_SIZE),
            });
        }
        if offset + JournalEntry::encoded_len(len) > self.file_len {
            return Ok(ReadOutcome::Torn { offset });
        }

        let mut payload = vec![0u8; len as usize];
        if !self.read_full(&mut payload)? {
            return Ok(ReadOutcome::Torn { offset });
        }

        if lsn != self.last_lsn + 1 {
            return Ok(ReadOutcome::Corrupt {
                offset,
                reason: format!("expected lsn {}, found {}", self.last_lsn + 1, lsn),
            });
        }

        match JournalEntry::from_parts(lsn, crc, &payload) {
            Ok(entry) => {
                self.position = offset + JournalEntry::encoded_len(len);
                self.last_lsn = lsn;
                Ok(ReadOutcome::Entry(entry))
            }
            Err(ScheduleError::JournalCorruption(reason)) => {
                Ok(ReadOutcome::Corrupt { offset, reason })
            }
            Err(e) => Err(e),
        }
    }

    /// Read every valid entry up to the first torn or corrupt one
    pub fn entries(mut self) -> Result<Vec<JournalEntry>> {
        let mut entries = Vec::new();
        while let ReadOutcome::Entry(entry) = self.next_entry()? {
            entries.push(entry);
        }
        Ok(entries)
    }

    /// Fill `buf`, returning false on a short read at end of file
    fn read_full(&mut self, buf: &mut [u8]) -> Result<bool> {
        match self.reader.read_exact(buf) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
