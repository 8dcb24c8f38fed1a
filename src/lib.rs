//! # gas-schedule
//!
//! Governed gas schedule for a deterministic ledger:
//! - A single versioned record whose feature version never regresses
//! - Immediate updates followed by a synchronous reconfiguration
//! - Epoch-deferred updates staged in a pending area and applied at the boundary
//! - One-time migration away from the legacy, unversioned format
//! - Crash-safe journal so every update is all-or-nothing
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 Governance / Epoch Transition                │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                        Governor                              │
//! │     Capability Guard → Authorizer → Codec → Version Check    │
//! └──────────┬──────────────────┬──────────────────┬────────────┘
//!            │                  │                  │
//!            ▼                  ▼                  ▼
//!   ┌────────────────┐  ┌───────────────┐  ┌───────────────┐
//!   │  ConfigStore   │  │ PendingStore  │  │ Reconfigurator│
//!   │ (legacy / v2)  │  │ (next epoch)  │  │  (broadcast)  │
//!   └───────┬────────┘  └───────┬───────┘  └───────────────┘
//!           │                   │
//!           ▼                   ▼
//!   ┌─────────────────────────────────────┐
//!   │              Journal                │
//!   │   (append-only, CRC32, one batch    │
//!   │        per committed update)        │
//!   └─────────────────────────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod schedule;
pub mod codec;
pub mod digest;
pub mod journal;
pub mod store;
pub mod pending;
pub mod pricing;
pub mod migration;
pub mod authority;
pub mod guard;
pub mod reconfig;
pub mod governor;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{ScheduleError, Result};
pub use config::Config;
pub use authority::Authority;
pub use guard::Mode;
pub use schedule::{ConfigEntry, LegacyConfig, VersionedConfig};
pub use governor::Governor;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of the crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
