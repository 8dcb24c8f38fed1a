//! Configuration for the gas schedule governor
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

use crate::error::{Result, ScheduleError};

/// Main configuration for a governor instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Root directory for all data files
    /// Internal structure:
    ///   {data_dir}/
    ///     └── state.journal    (append-only log of committed batches)
    pub data_dir: PathBuf,

    // -------------------------------------------------------------------------
    // Journal Configuration
    // -------------------------------------------------------------------------
    /// Sync strategy: how often to fsync the journal
    pub journal_sync_strategy: SyncStrategy,

    // -------------------------------------------------------------------------
    // Governance Configuration
    // -------------------------------------------------------------------------
    /// Address of the network owner, the only identity allowed to mutate
    pub owner: String,

    /// Initial value of the deferred-reconfiguration feature flag
    pub deferred_mode: bool,

    /// Largest configuration blob the default codec will decode (bytes)
    pub max_blob_size: u64,
}

/// Journal sync strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStrategy {
    /// fsync after every write (safest, slowest)
    EveryWrite,

    /// fsync after N unsynced entries (balanced durability/performance)
    EveryNEntries { count: usize },
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./gas_schedule_data"),
            journal_sync_strategy: SyncStrategy::EveryWrite,
            owner: "0x1".to_string(),
            deferred_mode: false,
            max_blob_size: 1024 * 1024, // 1 MB
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Reject configurations the governor cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.owner.trim().is_empty() {
            return Err(ScheduleError::Config("owner address must not be empty".to_string()));
        }
        if self.max_blob_size == 0 {
            return Err(ScheduleError::Config("max_blob_size must be positive".to_string()));
        }
        if let SyncStrategy::EveryNEntries { count: 0 } = self.journal_sync_strategy {
            return Err(ScheduleError::Config(
                "EveryNEntries sync strategy needs a positive count".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the data directory (root for all storage)
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    /// Set the journal sync strategy
    pub fn journal_sync_strategy(mut self, strategy: SyncStrategy) -> Self {
        self.config.journal_sync_strategy = strategy;
        self
    }

    /// Set the network owner address
    pub fn owner(mut self, owner: impl Into<String>) -> Self {
        self.config.owner = owner.into();
        self
    }

    /// Start with deferred-reconfiguration mode on or off
    pub fn deferred_mode(mut self, active: bool) -> Self {
        self.config.deferred_mode = active;
        self
    }

    /// Set the maximum accepted blob size (in bytes)
    pub fn max_blob_size(mut self, size: u64) -> Self {
        self.config.max_blob_size = size;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
