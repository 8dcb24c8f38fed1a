//! Blob codec
//!
//! Turns raw governance blobs into `VersionedConfig` values and back.
//!
//! The wire encoding belongs to whoever produces the blobs, so the governor
//! only talks to the `BlobCodec` trait. `BincodeCodec` is the default:
//!
//! ```text
//! ┌──────────────────┬───────────┬──────────────────────────────────────┐
//! │ feature_version  │ count (8) │ (name_len (8) + name + value (8))... │
//! │       (8)        │           │                                      │
//! └──────────────────┴───────────┴──────────────────────────────────────┘
//! ```
//! All integers little-endian, fixed width. Trailing bytes are rejected.

use bincode::Options;

use crate::error::{Result, ScheduleError};
use crate::schedule::{ensure_unique_names, VersionedConfig};

/// Decodes and encodes configuration blobs
pub trait BlobCodec: Send + Sync {
    /// Decode a non-empty blob into a schedule
    fn decode(&self, blob: &[u8]) -> Result<VersionedConfig>;

    /// Encode a schedule into its blob form
    fn encode(&self, config: &VersionedConfig) -> Result<Vec<u8>>;
}

/// Default codec: fixed-width little-endian bincode
#[derive(Debug, Clone, Copy)]
pub struct BincodeCodec {
    max_blob_size: u64,
}

impl BincodeCodec {
    pub fn new(max_blob_size: u64) -> Self {
        Self { max_blob_size }
    }

    fn options(&self) -> impl Options {
        bincode::DefaultOptions::new()
            .with_fixint_encoding()
            .with_little_endian()
            .reject_trailing_bytes()
            .with_limit(self.max_blob_size)
    }
}

impl Default for BincodeCodec {
    fn default() -> Self {
        Self::new(1024 * 1024)
    }
}

impl BlobCodec for BincodeCodec {
    fn decode(&self, blob: &[u8]) -> Result<VersionedConfig> {
        if blob.len() as u64 > self.max_blob_size {
            return Err(ScheduleError::InvalidInput(format!(
                "blob too large: {} bytes (max {})",
                blob.len(),
                self.max_blob_size
            )));
        }

        let config: VersionedConfig = self
            .options()
            .deserialize(blob)
            .map_err(|e| ScheduleError::InvalidInput(format!("malformed gas schedule: {}", e)))?;

        ensure_unique_names(&config.entries)?;
        Ok(config)
    }

    fn encode(&self, config: &VersionedConfig) -> Result<Vec<u8>> {
        self.options()
            .serialize(config)
            .map_err(|e| ScheduleError::Serialization(e.to_string()))
    }
}
