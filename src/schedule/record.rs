//! Stored record definitions
//!
//! Exactly one of the two formats lives in storage at a time.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::ConfigEntry;

/// Pre-versioning record format, kept only so it can be migrated away
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LegacyConfig {
    pub entries: Vec<ConfigEntry>,
}

impl LegacyConfig {
    pub fn new(entries: Vec<ConfigEntry>) -> Self {
        Self { entries }
    }
}

/// The live gas schedule
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VersionedConfig {
    /// Monotonic version of the gas feature set this schedule targets
    pub feature_version: u64,

    /// Cost parameters in insertion order
    pub entries: Vec<ConfigEntry>,
}

impl VersionedConfig {
    pub fn new(feature_version: u64, entries: Vec<ConfigEntry>) -> Self {
        Self {
            feature_version,
            entries,
        }
    }

    /// Look up a parameter by name
    pub fn get(&self, name: &str) -> Option<u64> {
        self.entries
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| entry.value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Storage slot a record lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RecordKind {
    Legacy,
    Versioned,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKind::Legacy => write!(f, "legacy"),
            RecordKind::Versioned => write!(f, "versioned"),
        }
    }
}

/// A record as held by a `ConfigStore`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoredRecord {
    Legacy(LegacyConfig),
    Versioned(VersionedConfig),
}

impl StoredRecord {
    pub fn kind(&self) -> RecordKind {
        match self {
            StoredRecord::Legacy(_) => RecordKind::Legacy,
            StoredRecord::Versioned(_) => RecordKind::Versioned,
        }
    }

    pub fn entries(&self) -> &[ConfigEntry] {
        match self {
            StoredRecord::Legacy(legacy) => &legacy.entries,
            StoredRecord::Versioned(versioned) => &versioned.entries,
        }
    }
}
