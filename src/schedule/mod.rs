//! Schedule Module
//!
//! Data model for the gas schedule record.
//!
//! ## Record Formats
//! ```text
//! LegacyConfig (deprecated, no version)
//! ┌─────────────────────────────────────────┐
//! │ entries: [(name, value), ...]           │
//! └─────────────────────────────────────────┘
//!
//! VersionedConfig (authoritative)
//! ┌──────────────────┬──────────────────────┐
//! │ feature_version  │ entries: [(name, v)] │
//! └──────────────────┴──────────────────────┘
//! ```
//!
//! Entry order is insertion order and is part of the encoded format, so
//! entries are kept in a `Vec` and never sorted.

mod entry;
mod record;

pub use entry::{ensure_unique_names, ConfigEntry};
pub use record::{LegacyConfig, RecordKind, StoredRecord, VersionedConfig};

/// A configuration type that can be staged in the pending area
///
/// The pending area holds at most one candidate per type, addressed by
/// `TYPE_TAG`.
pub trait OnChainConfig {
    const TYPE_TAG: &'static str;
}

impl OnChainConfig for VersionedConfig {
    const TYPE_TAG: &'static str = "gas_schedule::VersionedConfig";
}
