//! Schedule entry definitions

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScheduleError};

/// A single named cost parameter
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConfigEntry {
    /// Parameter name, e.g. `instr.add` or `storage.per_byte`
    pub name: String,

    /// Parameter value in internal gas units
    pub value: u64,
}

impl ConfigEntry {
    pub fn new(name: impl Into<String>, value: u64) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// Reject entry lists that repeat a name
pub fn ensure_unique_names(entries: &[ConfigEntry]) -> Result<()> {
    let mut seen = HashSet::with_capacity(entries.len());
    for entry in entries {
        if !seen.insert(entry.name.as_str()) {
            return Err(ScheduleError::InvalidInput(format!(
                "duplicate entry name: {}",
                entry.name
            )));
        }
    }
    Ok(())
}
