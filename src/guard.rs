//! Capability Guard
//!
//! Every mutating operation takes one snapshot of the deferred-reconfiguration
//! flag and checks it before anything else. The snapshot is reused for the
//! rest of the operation so a flag flip cannot change the path mid-way.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{Result, ScheduleError};

/// Source of the deferred-reconfiguration feature flag
pub trait FeatureFlags: Send + Sync {
    fn is_deferred_mode_active(&self) -> bool;
}

/// Feature flag held in process, switchable at runtime
#[derive(Debug, Default)]
pub struct ModeSwitch {
    deferred: AtomicBool,
}

impl ModeSwitch {
    pub fn new(deferred: bool) -> Self {
        Self {
            deferred: AtomicBool::new(deferred),
        }
    }

    pub fn set_deferred(&self, active: bool) {
        self.deferred.store(active, Ordering::SeqCst);
    }
}

impl FeatureFlags for ModeSwitch {
    fn is_deferred_mode_active(&self) -> bool {
        self.deferred.load(Ordering::SeqCst)
    }
}

/// Reconfiguration mode in effect for one operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Changes apply in place followed by a synchronous reconfiguration
    Immediate,

    /// Changes are staged and applied at the next epoch boundary
    Deferred,
}

impl Mode {
    /// Read the flag once
    pub fn snapshot(flags: &dyn FeatureFlags) -> Self {
        if flags.is_deferred_mode_active() {
            Mode::Deferred
        } else {
            Mode::Immediate
        }
    }

    /// Fail with `OperationDisabled` unless this is the expected mode
    pub fn require(self, expected: Mode, operation: &'static str) -> Result<()> {
        if self == expected {
            Ok(())
        } else {
            Err(ScheduleError::OperationDisabled {
                operation,
                mode: self,
            })
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Immediate => write!(f, "immediate"),
            Mode::Deferred => write!(f, "deferred"),
        }
    }
}
