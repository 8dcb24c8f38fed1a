//! Schedule digests
//!
//! A `ScheduleDigest` is the SHA-512 of a schedule's encoded blob. Proposals
//! built against a known schedule carry its digest, so they can be refused
//! if the live schedule moved in the meantime.

use std::fmt;
use std::str::FromStr;

use sha2::{Digest, Sha512};

use crate::error::ScheduleError;

/// Digest length in bytes
pub const DIGEST_LEN: usize = 64;

/// SHA-512 digest of an encoded gas schedule
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScheduleDigest([u8; DIGEST_LEN]);

impl ScheduleDigest {
    /// Hash an encoded blob
    pub fn compute(blob: &[u8]) -> Self {
        let mut out = [0u8; DIGEST_LEN];
        out.copy_from_slice(&Sha512::digest(blob));
        Self(out)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, ScheduleError> {
        if bytes.len() != DIGEST_LEN {
            return Err(ScheduleError::InvalidInput(format!(
                "digest must be {} bytes, got {}",
                DIGEST_LEN,
                bytes.len()
            )));
        }
        let mut out = [0u8; DIGEST_LEN];
        out.copy_from_slice(bytes);
        Ok(Self(out))
    }

    pub fn as_bytes(&self) -> &[u8; DIGEST_LEN] {
        &self.0
    }
}

impl fmt::Debug for ScheduleDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ScheduleDigest({}..)", hex::encode(&self.0[..8]))
    }
}

impl fmt::Display for ScheduleDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl FromStr for ScheduleDigest {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s.trim_start_matches("0x"))
            .map_err(|e| ScheduleError::InvalidInput(format!("bad digest hex: {}", e)))?;
        Self::from_slice(&bytes)
    }
}
