//! Tests for Governor
//!
//! These tests verify:
//! - Genesis initialization (versioned and legacy)
//! - Immediate updates and version monotonicity
//! - Deferred staging and epoch-boundary application
//! - Mutual exclusivity of the two paths
//! - Legacy migration
//! - Storage pricing forwarding
//! - No side effects on any rejected operation

use std::sync::Arc;

use crossbeam::channel::Receiver;
use gas_schedule::codec::{BincodeCodec, BlobCodec};
use gas_schedule::digest::ScheduleDigest;
use gas_schedule::guard::ModeSwitch;
use gas_schedule::pricing::StoragePricing;
use gas_schedule::reconfig::{ChannelReconfigurator, ReconfigEvent, ReconfigReason};
use gas_schedule::schedule::{RecordKind, StoredRecord};
use bytes::Bytes;
use gas_schedule::store::{ConfigStore, MemoryStore, PendingStore, RecordOp};
use gas_schedule::{
    Authority, Config, ConfigEntry, Governor, LegacyConfig, Mode, ScheduleError, VersionedConfig,
};

// =============================================================================
// Helper Functions
// =============================================================================

const OWNER: &str = "0x1";

struct Harness {
    governor: Governor,
    switch: Arc<ModeSwitch>,
    store: Arc<MemoryStore>,
    events: Receiver<ReconfigEvent>,
}

fn setup(deferred: bool) -> Harness {
    let switch = Arc::new(ModeSwitch::new(deferred));
    let store = Arc::new(MemoryStore::new());
    let reconfig = Arc::new(ChannelReconfigurator::new());
    let events = reconfig.subscribe();

    let governor = Governor::builder(Config::builder().owner(OWNER).build())
        .state(store.clone())
        .flags(switch.clone())
        .reconfigurator(reconfig)
        .build()
        .unwrap();

    Harness {
        governor,
        switch,
        store,
        events,
    }
}

fn owner() -> Authority {
    Authority::new(OWNER)
}

fn blob(version: u64, entries: &[(&str, u64)]) -> Vec<u8> {
    let entries = entries
        .iter()
        .map(|(name, value)| ConfigEntry::new(*name, *value))
        .collect();
    BincodeCodec::default()
        .encode(&VersionedConfig::new(version, entries))
        .unwrap()
}

fn genesis(h: &Harness, version: u64) {
    h.governor
        .initialize(&owner(), &blob(version, &[("gas.unit", 100)]))
        .unwrap();
}

// =============================================================================
// Genesis Tests
// =============================================================================

#[test]
fn test_initialize_installs_schedule() {
    let h = setup(false);
    genesis(&h, 1);

    let current = h.governor.current().unwrap().unwrap();
    assert_eq!(current.feature_version, 1);
    assert_eq!(current.get("gas.unit"), Some(100));
    // Genesis does not reconfigure
    assert_eq!(h.events.try_iter().count(), 0);
}

#[test]
fn test_initialize_twice_fails() {
    let h = setup(false);
    genesis(&h, 1);

    let err = h
        .governor
        .initialize(&owner(), &blob(2, &[("gas.unit", 1)]))
        .unwrap_err();

    assert!(matches!(err, ScheduleError::AlreadyInitialized));
    assert_eq!(h.governor.feature_version().unwrap(), Some(1));
}

#[test]
fn test_initialize_after_legacy_genesis_fails() {
    let h = setup(false);
    h.governor
        .initialize_legacy(&owner(), LegacyConfig::new(vec![ConfigEntry::new("gas.unit", 1)]))
        .unwrap();

    let err = h
        .governor
        .initialize(&owner(), &blob(1, &[("gas.unit", 1)]))
        .unwrap_err();
    assert!(matches!(err, ScheduleError::AlreadyInitialized));
}

#[test]
fn test_initialize_empty_blob_fails() {
    let h = setup(false);

    let err = h.governor.initialize(&owner(), &[]).unwrap_err();

    assert!(matches!(err, ScheduleError::InvalidInput(_)));
    assert!(h.governor.current().unwrap().is_none());
}

#[test]
fn test_initialize_requires_owner() {
    let h = setup(false);

    let err = h
        .governor
        .initialize(&Authority::new("0xbeef"), &blob(1, &[]))
        .unwrap_err();

    assert!(matches!(err, ScheduleError::Unauthorized(_)));
    assert!(h.governor.current().unwrap().is_none());
}

// =============================================================================
// Immediate Path Tests
// =============================================================================

#[test]
fn test_set_current_sequence_ends_at_last_version() {
    let h = setup(false);
    genesis(&h, 1);

    h.governor
        .set_current(&owner(), &blob(3, &[("gas.unit", 110)]))
        .unwrap();
    h.governor
        .set_current(&owner(), &blob(7, &[("gas.unit", 130)]))
        .unwrap();

    assert_eq!(h.governor.feature_version().unwrap(), Some(7));
    assert_eq!(h.events.try_iter().count(), 2);
}

#[test]
fn test_set_current_same_version_allowed() {
    let h = setup(false);
    genesis(&h, 4);

    h.governor
        .set_current(&owner(), &blob(4, &[("gas.unit", 5)]))
        .unwrap();

    let current = h.governor.current().unwrap().unwrap();
    assert_eq!(current.feature_version, 4);
    assert_eq!(current.get("gas.unit"), Some(5));
}

#[test]
fn test_set_current_regression_rejected() {
    let h = setup(false);
    genesis(&h, 5);
    let before = h.governor.current().unwrap();

    let err = h
        .governor
        .set_current(&owner(), &blob(4, &[("gas.unit", 1)]))
        .unwrap_err();

    assert!(matches!(
        err,
        ScheduleError::VersionRegression {
            current: 5,
            proposed: 4
        }
    ));
    assert_eq!(h.governor.current().unwrap(), before);
    assert_eq!(h.events.try_iter().count(), 0);
}

#[test]
fn test_set_current_empty_blob_rejected() {
    let h = setup(false);
    genesis(&h, 1);
    let before = h.store.snapshot();

    let err = h.governor.set_current(&owner(), &[]).unwrap_err();

    assert!(matches!(err, ScheduleError::InvalidInput(_)));
    assert_eq!(h.store.snapshot(), before);
    assert_eq!(h.events.try_iter().count(), 0);
}

#[test]
fn test_set_current_malformed_blob_rejected() {
    let h = setup(false);
    genesis(&h, 1);
    let before = h.store.snapshot();

    let err = h.governor.set_current(&owner(), &[1, 2, 3]).unwrap_err();

    assert!(matches!(err, ScheduleError::InvalidInput(_)));
    assert_eq!(h.store.snapshot(), before);
}

#[test]
fn test_set_current_duplicate_names_rejected() {
    let h = setup(false);
    genesis(&h, 1);

    let err = h
        .governor
        .set_current(&owner(), &blob(2, &[("gas.unit", 1), ("gas.unit", 2)]))
        .unwrap_err();

    assert!(matches!(err, ScheduleError::InvalidInput(_)));
    assert_eq!(h.governor.feature_version().unwrap(), Some(1));
}

#[test]
fn test_set_current_requires_owner() {
    let h = setup(false);
    genesis(&h, 1);

    let err = h
        .governor
        .set_current(&Authority::new("0x2"), &blob(2, &[]))
        .unwrap_err();

    assert!(matches!(err, ScheduleError::Unauthorized(_)));
    assert_eq!(h.governor.feature_version().unwrap(), Some(1));
    assert_eq!(h.events.try_iter().count(), 0);
}

#[test]
fn test_set_current_preserves_entry_order() {
    let h = setup(false);
    genesis(&h, 1);

    h.governor
        .set_current(&owner(), &blob(2, &[("z", 1), ("a", 2), ("m", 3)]))
        .unwrap();

    let names: Vec<String> = h
        .governor
        .current()
        .unwrap()
        .unwrap()
        .entries
        .into_iter()
        .map(|entry| entry.name)
        .collect();
    assert_eq!(names, vec!["z", "a", "m"]);
}

// =============================================================================
// Mode Exclusivity Tests
// =============================================================================

#[test]
fn test_set_current_disabled_in_deferred_mode() {
    let h = setup(true);

    // The mode check comes before authority and input checks
    let err = h
        .governor
        .set_current(&Authority::new("0xbad"), &[])
        .unwrap_err();

    assert!(matches!(
        err,
        ScheduleError::OperationDisabled {
            operation: "set_current",
            mode: Mode::Deferred
        }
    ));
}

#[test]
fn test_stage_disabled_in_immediate_mode() {
    let h = setup(false);
    genesis(&h, 1);

    let err = h
        .governor
        .stage_for_next_epoch(&owner(), &blob(2, &[]))
        .unwrap_err();

    assert!(matches!(err, ScheduleError::OperationDisabled { .. }));
    assert!(h.governor.staged().unwrap().is_none());
}

#[test]
fn test_apply_disabled_in_immediate_mode() {
    let h = setup(false);

    let err = h.governor.apply_staged(&owner()).unwrap_err();

    assert!(matches!(
        err,
        ScheduleError::OperationDisabled {
            operation: "apply_staged",
            mode: Mode::Immediate
        }
    ));
}

#[test]
fn test_mode_flip_switches_legal_path() {
    let h = setup(false);
    genesis(&h, 1);

    h.governor.set_current(&owner(), &blob(2, &[])).unwrap();

    h.switch.set_deferred(true);
    assert!(h.governor.set_current(&owner(), &blob(3, &[])).is_err());
    h.governor
        .stage_for_next_epoch(&owner(), &blob(3, &[]))
        .unwrap();

    assert_eq!(h.governor.mode(), Mode::Deferred);
    assert_eq!(h.governor.feature_version().unwrap(), Some(2));
}

// =============================================================================
// Deferred Path Tests
// =============================================================================

#[test]
fn test_stage_then_apply() {
    let h = setup(true);
    genesis(&h, 1);

    h.governor
        .stage_for_next_epoch(&owner(), &blob(2, &[("gas.unit", 120)]))
        .unwrap();

    // Invisible until the epoch boundary
    assert_eq!(h.governor.feature_version().unwrap(), Some(1));

    assert!(h.governor.apply_staged(&owner()).unwrap());

    let current = h.governor.current().unwrap().unwrap();
    assert_eq!(current, VersionedConfig::new(2, vec![ConfigEntry::new("gas.unit", 120)]));
    assert!(h.governor.staged().unwrap().is_none());
    assert_eq!(h.events.try_iter().count(), 0);
}

#[test]
fn test_apply_twice_is_noop() {
    let h = setup(true);
    genesis(&h, 1);
    h.governor
        .stage_for_next_epoch(&owner(), &blob(2, &[("gas.unit", 120)]))
        .unwrap();
    h.governor.apply_staged(&owner()).unwrap();
    let after_first = h.store.snapshot();

    assert!(!h.governor.apply_staged(&owner()).unwrap());
    assert_eq!(h.store.snapshot(), after_first);
}

#[test]
fn test_apply_with_nothing_staged() {
    let h = setup(true);
    genesis(&h, 1);

    assert!(!h.governor.apply_staged(&owner()).unwrap());
    assert_eq!(h.governor.feature_version().unwrap(), Some(1));
}

#[test]
fn test_restage_overwrites_candidate() {
    let h = setup(true);
    genesis(&h, 1);

    h.governor
        .stage_for_next_epoch(&owner(), &blob(2, &[("gas.unit", 1)]))
        .unwrap();
    h.governor
        .stage_for_next_epoch(&owner(), &blob(3, &[("gas.unit", 2)]))
        .unwrap();
    h.governor.apply_staged(&owner()).unwrap();

    let current = h.governor.current().unwrap().unwrap();
    assert_eq!(current.feature_version, 3);
    assert_eq!(current.get("gas.unit"), Some(2));
}

#[test]
fn test_stage_regression_rejected() {
    let h = setup(true);
    genesis(&h, 5);

    let err = h
        .governor
        .stage_for_next_epoch(&owner(), &blob(4, &[]))
        .unwrap_err();

    assert!(matches!(err, ScheduleError::VersionRegression { .. }));
    assert!(h.governor.staged().unwrap().is_none());
}

#[test]
fn test_stage_empty_blob_rejected() {
    let h = setup(true);
    genesis(&h, 1);

    let err = h.governor.stage_for_next_epoch(&owner(), &[]).unwrap_err();

    assert!(matches!(err, ScheduleError::InvalidInput(_)));
    assert!(h.governor.staged().unwrap().is_none());
}

#[test]
fn test_failed_restage_keeps_earlier_candidate() {
    let h = setup(true);
    genesis(&h, 1);
    h.governor
        .stage_for_next_epoch(&owner(), &blob(2, &[]))
        .unwrap();

    assert!(h.governor.stage_for_next_epoch(&owner(), &[0xff]).is_err());

    assert_eq!(h.governor.staged().unwrap().unwrap().feature_version, 2);
}

#[test]
fn test_apply_trusts_staged_version() {
    let h = setup(true);
    genesis(&h, 1);
    h.governor
        .stage_for_next_epoch(&owner(), &blob(5, &[]))
        .unwrap();

    // Live version moves past the staged one through the immediate path
    h.switch.set_deferred(false);
    h.governor.set_current(&owner(), &blob(10, &[])).unwrap();
    h.switch.set_deferred(true);

    // The commit step does not re-check the version
    assert!(h.governor.apply_staged(&owner()).unwrap());
    assert_eq!(h.governor.feature_version().unwrap(), Some(5));
}

#[test]
fn test_apply_requires_owner() {
    let h = setup(true);
    genesis(&h, 1);
    h.governor
        .stage_for_next_epoch(&owner(), &blob(2, &[]))
        .unwrap();

    let err = h.governor.apply_staged(&Authority::new("0x2")).unwrap_err();

    assert!(matches!(err, ScheduleError::Unauthorized(_)));
    assert!(h.governor.staged().unwrap().is_some());
    assert_eq!(h.governor.feature_version().unwrap(), Some(1));
}

#[test]
fn test_stage_checked_with_live_digest() {
    let h = setup(true);
    genesis(&h, 1);
    let digest = h.governor.current_digest().unwrap().unwrap();

    h.governor
        .stage_for_next_epoch_checked(&owner(), &digest, &blob(2, &[]))
        .unwrap();

    assert_eq!(h.governor.staged().unwrap().unwrap().feature_version, 2);
}

#[test]
fn test_stage_checked_with_stale_digest() {
    let h = setup(true);
    genesis(&h, 1);
    let stale = ScheduleDigest::compute(&blob(0, &[("gas.unit", 1)]));

    let err = h
        .governor
        .stage_for_next_epoch_checked(&owner(), &stale, &blob(2, &[]))
        .unwrap_err();

    assert!(matches!(err, ScheduleError::DigestMismatch));
    assert!(h.governor.staged().unwrap().is_none());
}

// =============================================================================
// Legacy Migration Tests
// =============================================================================

fn legacy_genesis(h: &Harness) {
    h.governor
        .initialize_legacy(
            &owner(),
            LegacyConfig::new(vec![ConfigEntry::new("gas.unit", 90)]),
        )
        .unwrap();
}

#[test]
fn test_set_current_migrates_legacy() {
    let h = setup(false);
    legacy_genesis(&h);
    assert!(h.governor.current().unwrap().is_none());

    // Any version is accepted when only the legacy record exists
    h.governor
        .set_current(&owner(), &blob(0, &[("gas.unit", 95)]))
        .unwrap();

    assert!(h.governor.legacy().unwrap().is_none());
    assert_eq!(h.governor.feature_version().unwrap(), Some(0));
    assert!(!h.store.exists(RecordKind::Legacy).unwrap());
    assert_eq!(h.events.try_iter().count(), 1);
}

#[test]
fn test_apply_staged_migrates_legacy() {
    let h = setup(true);
    legacy_genesis(&h);

    h.governor
        .stage_for_next_epoch(&owner(), &blob(1, &[("gas.unit", 95)]))
        .unwrap();
    assert!(h.governor.legacy().unwrap().is_some());

    h.governor.apply_staged(&owner()).unwrap();

    assert!(h.governor.legacy().unwrap().is_none());
    assert_eq!(h.governor.feature_version().unwrap(), Some(1));
}

// =============================================================================
// Storage Pricing Tests
// =============================================================================

#[test]
fn test_storage_pricing_reconfigures_in_immediate_mode() {
    let h = setup(false);
    genesis(&h, 1);
    let before = h.governor.current().unwrap();

    h.governor
        .set_storage_pricing(&owner(), StoragePricing::default())
        .unwrap();

    assert_eq!(h.governor.storage_pricing().unwrap(), Some(StoragePricing::default()));
    assert_eq!(h.governor.current().unwrap(), before);
    let events: Vec<ReconfigEvent> = h.events.try_iter().collect();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].reason, ReconfigReason::StoragePricing);
}

#[test]
fn test_storage_pricing_silent_in_deferred_mode() {
    let h = setup(true);

    h.governor
        .set_storage_pricing(&owner(), StoragePricing::default())
        .unwrap();

    assert!(h.governor.storage_pricing().unwrap().is_some());
    assert_eq!(h.events.try_iter().count(), 0);
}

#[test]
fn test_storage_pricing_requires_owner() {
    let h = setup(false);

    let err = h
        .governor
        .set_storage_pricing(&Authority::new("0x2"), StoragePricing::default())
        .unwrap_err();

    assert!(matches!(err, ScheduleError::Unauthorized(_)));
    assert!(h.governor.storage_pricing().unwrap().is_none());
    assert_eq!(h.events.try_iter().count(), 0);
}

// =============================================================================
// Failure Atomicity Tests
// =============================================================================

/// A record store whose commits always fail
struct FailingStore {
    inner: MemoryStore,
}

impl ConfigStore for FailingStore {
    fn get(&self, kind: RecordKind) -> gas_schedule::Result<Option<StoredRecord>> {
        self.inner.get(kind)
    }

    fn commit(&self, _ops: Vec<RecordOp>) -> gas_schedule::Result<()> {
        Err(ScheduleError::Storage("disk full".to_string()))
    }
}

#[test]
fn test_store_failure_raises_no_reconfiguration() {
    let inner = MemoryStore::new();
    inner
        .put(StoredRecord::Versioned(VersionedConfig::new(1, vec![])))
        .unwrap();
    let reconfig = Arc::new(ChannelReconfigurator::new());
    let events = reconfig.subscribe();

    let governor = Governor::builder(Config::builder().owner(OWNER).build())
        .config_store(Arc::new(FailingStore { inner }))
        .reconfigurator(reconfig)
        .build()
        .unwrap();

    let err = governor.set_current(&owner(), &blob(2, &[])).unwrap_err();

    assert!(matches!(err, ScheduleError::Storage(_)));
    assert_eq!(governor.feature_version().unwrap(), Some(1));
    assert_eq!(events.try_iter().count(), 0);
}

#[test]
fn test_apply_store_failure_keeps_candidate_staged() {
    let inner = MemoryStore::new();
    inner
        .put(StoredRecord::Versioned(VersionedConfig::new(1, vec![])))
        .unwrap();
    let pending = Arc::new(MemoryStore::new());

    let governor = Governor::builder(Config::builder().owner(OWNER).deferred_mode(true).build())
        .config_store(Arc::new(FailingStore { inner }))
        .pending_store(pending)
        .build()
        .unwrap();

    governor.stage_for_next_epoch(&owner(), &blob(2, &[])).unwrap();
    assert!(governor.apply_staged(&owner()).is_err());

    assert_eq!(governor.staged().unwrap().unwrap().feature_version, 2);
    assert_eq!(governor.feature_version().unwrap(), Some(1));
}

/// A pending area that can stage but never clear
struct StickyPending {
    inner: MemoryStore,
}

impl PendingStore for StickyPending {
    fn stage(&self, tag: &str, payload: Bytes) -> gas_schedule::Result<()> {
        self.inner.stage(tag, payload)
    }

    fn staged(&self, tag: &str) -> gas_schedule::Result<Option<Bytes>> {
        self.inner.staged(tag)
    }

    fn clear(&self, _tag: &str) -> gas_schedule::Result<()> {
        Err(ScheduleError::Storage("pending area is read-only".to_string()))
    }
}

#[test]
fn test_apply_pending_clear_failure_changes_nothing() {
    let switch = Arc::new(ModeSwitch::new(true));
    let governor = Governor::builder(Config::builder().owner(OWNER).build())
        .config_store(Arc::new(MemoryStore::new()))
        .pending_store(Arc::new(StickyPending {
            inner: MemoryStore::new(),
        }))
        .flags(switch.clone())
        .build()
        .unwrap();

    governor.initialize(&owner(), &blob(1, &[("gas.unit", 100)])).unwrap();
    governor.stage_for_next_epoch(&owner(), &blob(3, &[("gas.unit", 130)])).unwrap();

    let err = governor.apply_staged(&owner()).unwrap_err();

    assert!(matches!(err, ScheduleError::Storage(_)));
    assert_eq!(governor.feature_version().unwrap(), Some(1));
    assert_eq!(governor.staged().unwrap().unwrap().feature_version, 3);

    // The live record moves on; the failed apply did not land behind it
    switch.set_deferred(false);
    governor.set_current(&owner(), &blob(5, &[("gas.unit", 150)])).unwrap();
    assert_eq!(governor.feature_version().unwrap(), Some(5));
}

#[test]
fn test_apply_on_shared_store_clears_candidate_with_record() {
    let h = setup(true);
    genesis(&h, 1);
    h.governor.stage_for_next_epoch(&owner(), &blob(3, &[("gas.unit", 130)])).unwrap();

    assert!(h.governor.apply_staged(&owner()).unwrap());

    let state = h.store.snapshot();
    assert_eq!(state.versioned.map(|v| v.feature_version), Some(3));
    assert!(state.pending.is_empty());

    // A later version cannot be rolled back by the already-applied candidate
    h.switch.set_deferred(false);
    h.governor.set_current(&owner(), &blob(5, &[("gas.unit", 150)])).unwrap();
    h.switch.set_deferred(true);
    assert!(!h.governor.apply_staged(&owner()).unwrap());
    assert_eq!(h.governor.feature_version().unwrap(), Some(5));
}

#[test]
fn test_default_reconfigurator_is_subscribable() {
    let governor = Governor::builder(Config::builder().owner(OWNER).build())
        .build()
        .unwrap();
    let events = governor.subscribe().unwrap();

    governor.initialize(&owner(), &blob(1, &[])).unwrap();
    governor.set_current(&owner(), &blob(2, &[])).unwrap();

    let received: Vec<ReconfigEvent> = events.try_iter().collect();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].reason, ReconfigReason::GasSchedule);
}

#[test]
fn test_injected_reconfigurator_is_not_shadowed() {
    let h = setup(false);

    assert!(h.governor.subscribe().is_none());
}
