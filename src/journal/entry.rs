//! Journal entry definitions
//!
//! Defines the structure of individual journal entries and their framing.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScheduleError};
use crate::store::StateOp;

/// Header size: LSN (8) + CRC (4) + Len (4)
pub const HEADER_SIZE: usize = 16;

/// Upper bound on a single entry payload (16 MB)
pub const MAX_ENTRY_SIZE: u32 = 16 * 1024 * 1024;

/// A single entry in the journal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalEntry {
    /// Log Sequence Number - monotonically increasing, starts at 1
    pub lsn: u64,

    /// Operations committed together
    pub ops: Vec<StateOp>,

    /// Timestamp (unix millis) when entry was created
    pub timestamp: u64,
}

/// Serialized payload (everything except the header)
#[derive(Serialize, Deserialize)]
struct Payload {
    ops: Vec<StateOp>,
    timestamp: u64,
}

impl JournalEntry {
    /// Create a new entry stamped with the current time
    pub fn new(lsn: u64, ops: Vec<StateOp>) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);

        Self {
            lsn,
            ops,
            timestamp,
        }
    }

    /// Serialize to header + payload bytes
    pub fn serialize(&self) -> Result<Vec<u8>> {
        let payload = bincode::serialize(&Payload {
            ops: self.ops.clone(),
            timestamp: self.timestamp,
        })
        .map_err(|e| ScheduleError::Serialization(e.to_string()))?;

        if payload.len() > MAX_ENTRY_SIZE as usize {
            return Err(ScheduleError::JournalWrite(format!(
                "entry too large: {} bytes (max {})",
                payload.len(),
                MAX_ENTRY_SIZE
            )));
        }

        let mut bytes = Vec::with_capacity(HEADER_SIZE + payload.len());
        bytes.extend_from_slice(&self.lsn.to_le_bytes());
        bytes.extend_from_slice(&crc32fast::hash(&payload).to_le_bytes());
        bytes.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        bytes.extend_from_slice(&payload);
        Ok(bytes)
    }

    /// Deserialize from a complete header + payload buffer
    pub fn deserialize(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(ScheduleError::JournalCorruption(format!(
                "incomplete header: expected {} bytes, got {}",
                HEADER_SIZE,
                bytes.len()
            )));
        }

        let (lsn, crc, len) = Self::parse_header(&bytes[..HEADER_SIZE]);
        let end = HEADER_SIZE + len as usize;
        if bytes.len() < end {
            return Err(ScheduleError::JournalCorruption(format!(
                "incomplete payload: expected {} bytes, got {}",
                len,
                bytes.len() - HEADER_SIZE
            )));
        }

        Self::from_parts(lsn, crc, &bytes[HEADER_SIZE..end])
    }

    /// Split a header into (lsn, crc, payload_len)
    pub(crate) fn parse_header(header: &[u8]) -> (u64, u32, u32) {
        let mut lsn = [0u8; 8];
        let mut crc = [0u8; 4];
        let mut len = [0u8; 4];
        lsn.copy_from_slice(&header[0..8]);
        crc.copy_from_slice(&header[8..12]);
        len.copy_from_slice(&header[12..16]);
        (
            u64::from_le_bytes(lsn),
            u32::from_le_bytes(crc),
            u32::from_le_bytes(len),
        )
    }

    /// Build an entry from a parsed header and its payload, verifying the CRC
    pub(crate) fn from_parts(lsn: u64, crc: u32, payload: &[u8]) -> Result<Self> {
        let actual = crc32fast::hash(payload);
        if actual != crc {
            return Err(ScheduleError::JournalCorruption(format!(
                "CRC mismatch at lsn {}: stored {:08x}, computed {:08x}",
                lsn, crc, actual
            )));
        }

        let payload: Payload = bincode::deserialize(payload)
            .map_err(|e| ScheduleError::JournalCorruption(format!("undecodable payload: {}", e)))?;

        Ok(Self {
            lsn,
            ops: payload.ops,
            timestamp: payload.timestamp,
        })
    }

    /// Total encoded size of an entry with the given payload length
    pub fn encoded_len(payload_len: u32) -> u64 {
        HEADER_SIZE as u64 + payload_len as u64
    }
}
