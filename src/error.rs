//! Error types for the gas schedule
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

use crate::guard::Mode;

/// Result type alias using ScheduleError
pub type Result<T> = std::result::Result<T, ScheduleError>;

/// Unified error type for gas schedule operations
#[derive(Debug, Error)]
pub enum ScheduleError {
    // -------------------------------------------------------------------------
    // Governance Errors
    // -------------------------------------------------------------------------
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Version regression: proposed feature version {proposed} is below current {current}")]
    VersionRegression { current: u64, proposed: u64 },

    #[error("Operation {operation} is disabled while the network is in {mode} mode")]
    OperationDisabled { operation: &'static str, mode: Mode },

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Gas schedule already initialized")]
    AlreadyInitialized,

    #[error("Digest of the live gas schedule does not match the expected digest")]
    DigestMismatch,

    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Journal Errors
    // -------------------------------------------------------------------------
    #[error("Journal corruption detected: {0}")]
    JournalCorruption(String),

    #[error("Journal write failed: {0}")]
    JournalWrite(String),

    // -------------------------------------------------------------------------
    // Storage Errors
    // -------------------------------------------------------------------------
    #[error("Storage error: {0}")]
    Storage(String),

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Serialization error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ScheduleError {
    /// True for the errors a governance caller can correct by resubmitting
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            ScheduleError::InvalidInput(_)
                | ScheduleError::VersionRegression { .. }
                | ScheduleError::OperationDisabled { .. }
                | ScheduleError::Unauthorized(_)
                | ScheduleError::AlreadyInitialized
                | ScheduleError::DigestMismatch
        )
    }
}
