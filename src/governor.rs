//! Governor Module
//!
//! Coordinates the gas schedule update protocol.
//!
//! ## Responsibilities
//! - Genesis installation of the schedule
//! - Immediate updates followed by a synchronous reconfiguration
//! - Staging updates for the next epoch and committing them at the boundary
//! - Forwarding storage pricing to its owner
//!
//! Collaborators are injected as trait objects so the protocol runs the
//! same against the journaled store, an in-memory store, or a host ledger.

use std::sync::Arc;

use crossbeam::channel::Receiver;
use parking_lot::Mutex;

use crate::authority::{Authority, Authorizer, OwnerAuthorizer};
use crate::codec::{BincodeCodec, BlobCodec};
use crate::config::Config;
use crate::digest::ScheduleDigest;
use crate::error::{Result, ScheduleError};
use crate::guard::{FeatureFlags, Mode, ModeSwitch};
use crate::migration;
use crate::pending;
use crate::pricing::StoragePricing;
use crate::reconfig::{ChannelReconfigurator, ReconfigEvent, ReconfigReason, Reconfigurator};
use crate::schedule::{LegacyConfig, OnChainConfig, RecordKind, StoredRecord, VersionedConfig};
use crate::store::{
    ConfigStore, JournaledStore, MemoryStore, PendingStore, PricingStore, RecordOp, StateStore,
};

/// The gas schedule governor
///
/// ## Concurrency Model: one writer at a time
///
/// Every mutating operation holds `write_lock` for its whole duration, so
/// each one behaves as a single serialized ledger transaction. Checks run
/// first and the store batch is the last fallible step, so a failed
/// operation leaves no trace: no record swapped, nothing staged, no
/// reconfiguration raised.
///
/// Reads go straight to the stores and never take `write_lock`.
pub struct Governor {
    config: Config,
    store: Arc<dyn ConfigStore>,
    pending: Arc<dyn PendingStore>,
    pricing: Arc<dyn PricingStore>,
    flags: Arc<dyn FeatureFlags>,
    authorizer: Arc<dyn Authorizer>,
    reconfigurator: Arc<dyn Reconfigurator>,
    codec: Arc<dyn BlobCodec>,

    /// Set when record and pending area share one backend
    shared: Option<Arc<dyn StateStore>>,

    /// Default reconfigurator, when none was injected
    signals: Option<Arc<ChannelReconfigurator>>,

    /// Serializes mutating operations
    write_lock: Mutex<()>,
}

impl Governor {
    /// Open a governor persisting to `config.data_dir`
    ///
    /// Uses the default collaborators: journaled store, in-process mode
    /// switch seeded from `config.deferred_mode`, owner authorizer and
    /// bincode codec.
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;
        let store = Arc::new(JournaledStore::open(
            &config.data_dir,
            config.journal_sync_strategy,
        )?);
        Self::builder(config).state(store).build()
    }

    pub fn builder(config: Config) -> GovernorBuilder {
        GovernorBuilder::new(config)
    }

    // =========================================================================
    // Genesis
    // =========================================================================

    /// Install the first gas schedule
    ///
    /// Only before any record exists. No reconfiguration is raised; genesis
    /// configuration is loaded when the network starts.
    pub fn initialize(&self, authority: &Authority, blob: &[u8]) -> Result<()> {
        let _write_guard = self.write_lock.lock();

        self.authorizer.authorize(authority)?;
        self.ensure_uninitialized()?;
        let schedule = self.decode(blob)?;

        let version = schedule.feature_version;
        self.store.put(StoredRecord::Versioned(schedule))?;

        tracing::info!("Gas schedule initialized at feature version {}", version);
        Ok(())
    }

    /// Install a pre-versioning schedule at genesis
    pub fn initialize_legacy(&self, authority: &Authority, legacy: LegacyConfig) -> Result<()> {
        let _write_guard = self.write_lock.lock();

        self.authorizer.authorize(authority)?;
        self.ensure_uninitialized()?;
        crate::schedule::ensure_unique_names(&legacy.entries)?;

        let count = legacy.entries.len();
        self.store.put(StoredRecord::Legacy(legacy))?;

        tracing::info!("Legacy gas schedule initialized with {} entries", count);
        Ok(())
    }

    // =========================================================================
    // Immediate Path
    // =========================================================================

    /// Replace the live schedule now and reconfigure the network
    ///
    /// Disabled while deferred-reconfiguration mode is active.
    pub fn set_current(&self, authority: &Authority, blob: &[u8]) -> Result<()> {
        let _write_guard = self.write_lock.lock();

        Mode::snapshot(&*self.flags).require(Mode::Immediate, "set_current")?;
        self.authorizer.authorize(authority)?;

        self.replace(blob)?;
        self.reconfigurator.reconfigure(ReconfigReason::GasSchedule);
        Ok(())
    }

    /// Decode, check the version, and swap the record in one batch
    fn replace(&self, blob: &[u8]) -> Result<()> {
        let candidate = self.decode(blob)?;
        let proposed = candidate.feature_version;

        let ops = match self.live()? {
            Some(current) => {
                check_version(current.feature_version, proposed)?;
                vec![RecordOp::Put(StoredRecord::Versioned(candidate))]
            }
            None => migration::plan_install(&*self.store, candidate)?,
        };
        self.store.commit(ops)?;

        tracing::info!("Gas schedule replaced at feature version {}", proposed);
        Ok(())
    }

    // =========================================================================
    // Deferred Path
    // =========================================================================

    /// Stage a schedule to take effect at the next epoch boundary
    ///
    /// Replaces any earlier staged schedule. Disabled unless deferred mode
    /// is active.
    pub fn stage_for_next_epoch(&self, authority: &Authority, blob: &[u8]) -> Result<()> {
        self.stage(authority, blob, None, "stage_for_next_epoch")
    }

    /// Like `stage_for_next_epoch`, but only if the live schedule still
    /// hashes to `expected`
    pub fn stage_for_next_epoch_checked(
        &self,
        authority: &Authority,
        expected: &ScheduleDigest,
        blob: &[u8],
    ) -> Result<()> {
        self.stage(authority, blob, Some(expected), "stage_for_next_epoch_checked")
    }

    fn stage(
        &self,
        authority: &Authority,
        blob: &[u8],
        expected: Option<&ScheduleDigest>,
        operation: &'static str,
    ) -> Result<()> {
        let _write_guard = self.write_lock.lock();

        Mode::snapshot(&*self.flags).require(Mode::Deferred, operation)?;
        self.authorizer.authorize(authority)?;
        let candidate = self.decode(blob)?;

        if let Some(current) = self.live()? {
            if let Some(expected) = expected {
                if &self.digest_of(&current)? != expected {
                    return Err(ScheduleError::DigestMismatch);
                }
            }
            check_version(current.feature_version, candidate.feature_version)?;
        }

        pending::upsert(&*self.pending, &candidate)?;

        tracing::info!(
            "Gas schedule staged for next epoch at feature version {}",
            candidate.feature_version
        );
        Ok(())
    }

    /// Commit the staged schedule, if any (epoch-transition hook)
    ///
    /// Returns whether a schedule was applied. The staged schedule was
    /// version-checked when it was staged and is not checked again.
    ///
    /// With a shared backend the record swap and the removal of the staged
    /// candidate are one batch. With separate stores the candidate is
    /// removed first and restored if the record commit fails, so a
    /// candidate is never left staged after it went live.
    pub fn apply_staged(&self, authority: &Authority) -> Result<bool> {
        let _write_guard = self.write_lock.lock();

        Mode::snapshot(&*self.flags).require(Mode::Deferred, "apply_staged")?;
        self.authorizer.authorize(authority)?;

        let Some(staged) = pending::peek::<VersionedConfig>(&*self.pending)? else {
            tracing::debug!("No staged gas schedule at epoch boundary");
            return Ok(false);
        };

        let version = staged.feature_version;
        match &self.shared {
            Some(state) => {
                let ops = migration::plan_install(&*self.store, staged)?;
                state.commit_and_clear(ops, VersionedConfig::TYPE_TAG)?;
            }
            None => self.apply_split(staged)?,
        }

        tracing::info!("Staged gas schedule applied at feature version {}", version);
        Ok(true)
    }

    fn apply_split(&self, staged: VersionedConfig) -> Result<()> {
        let ops = migration::plan_install(&*self.store, staged.clone())?;
        pending::clear::<VersionedConfig>(&*self.pending)?;

        if let Err(e) = self.store.commit(ops) {
            if let Err(restore) = pending::upsert(&*self.pending, &staged) {
                tracing::error!(
                    "Failed to restore staged gas schedule after a failed apply: {}",
                    restore
                );
            }
            return Err(e);
        }
        Ok(())
    }

    // =========================================================================
    // Storage Pricing
    // =========================================================================

    /// Forward storage pricing to its owner
    ///
    /// Reconfigures immediately unless deferred mode is active, in which
    /// case the epoch transition picks the change up.
    pub fn set_storage_pricing(&self, authority: &Authority, pricing: StoragePricing) -> Result<()> {
        let _write_guard = self.write_lock.lock();

        let mode = Mode::snapshot(&*self.flags);
        self.authorizer.authorize(authority)?;

        self.pricing.set_pricing(pricing)?;
        tracing::info!("Storage pricing updated ({} mode)", mode);

        if mode == Mode::Immediate {
            self.reconfigurator.reconfigure(ReconfigReason::StoragePricing);
        }
        Ok(())
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// The live versioned schedule
    pub fn current(&self) -> Result<Option<VersionedConfig>> {
        self.live()
    }

    /// The legacy schedule, if migration has not happened yet
    pub fn legacy(&self) -> Result<Option<LegacyConfig>> {
        match self.store.get(RecordKind::Legacy)? {
            Some(StoredRecord::Legacy(legacy)) => Ok(Some(legacy)),
            Some(other) => Err(mismatched_kind(RecordKind::Legacy, &other)),
            None => Ok(None),
        }
    }

    pub fn feature_version(&self) -> Result<Option<u64>> {
        Ok(self.live()?.map(|schedule| schedule.feature_version))
    }

    /// The schedule waiting for the next epoch
    pub fn staged(&self) -> Result<Option<VersionedConfig>> {
        pending::peek::<VersionedConfig>(&*self.pending)
    }

    pub fn storage_pricing(&self) -> Result<Option<StoragePricing>> {
        self.pricing.pricing()
    }

    /// Digest to quote in `stage_for_next_epoch_checked`
    pub fn current_digest(&self) -> Result<Option<ScheduleDigest>> {
        match self.live()? {
            Some(current) => Ok(Some(self.digest_of(&current)?)),
            None => Ok(None),
        }
    }

    /// Mode the next operation would run in
    pub fn mode(&self) -> Mode {
        Mode::snapshot(&*self.flags)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Receive reconfiguration events raised from now on
    ///
    /// `None` when a custom reconfigurator was injected; subscribe to that
    /// one directly.
    pub fn subscribe(&self) -> Option<Receiver<ReconfigEvent>> {
        self.signals.as_ref().map(|signals| signals.subscribe())
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn decode(&self, blob: &[u8]) -> Result<VersionedConfig> {
        if blob.is_empty() {
            return Err(ScheduleError::InvalidInput(
                "configuration blob is empty".to_string(),
            ));
        }
        self.codec.decode(blob)
    }

    fn live(&self) -> Result<Option<VersionedConfig>> {
        match self.store.get(RecordKind::Versioned)? {
            Some(StoredRecord::Versioned(schedule)) => Ok(Some(schedule)),
            Some(other) => Err(mismatched_kind(RecordKind::Versioned, &other)),
            None => Ok(None),
        }
    }

    fn ensure_uninitialized(&self) -> Result<()> {
        if self.store.exists(RecordKind::Versioned)? || self.store.exists(RecordKind::Legacy)? {
            return Err(ScheduleError::AlreadyInitialized);
        }
        Ok(())
    }

    fn digest_of(&self, schedule: &VersionedConfig) -> Result<ScheduleDigest> {
        Ok(ScheduleDigest::compute(&self.codec.encode(schedule)?))
    }
}

fn check_version(current: u64, proposed: u64) -> Result<()> {
    if proposed < current {
        return Err(ScheduleError::VersionRegression { current, proposed });
    }
    Ok(())
}

fn mismatched_kind(expected: RecordKind, found: &StoredRecord) -> ScheduleError {
    ScheduleError::Storage(format!(
        "store returned a {} record for the {} slot",
        found.kind(),
        expected
    ))
}

/// Builder for Governor
///
/// Anything not set falls back to the in-process default.
pub struct GovernorBuilder {
    config: Config,
    store: Option<Arc<dyn ConfigStore>>,
    pending: Option<Arc<dyn PendingStore>>,
    pricing: Option<Arc<dyn PricingStore>>,
    flags: Option<Arc<dyn FeatureFlags>>,
    authorizer: Option<Arc<dyn Authorizer>>,
    reconfigurator: Option<Arc<dyn Reconfigurator>>,
    codec: Option<Arc<dyn BlobCodec>>,
    shared: Option<Arc<dyn StateStore>>,
}

impl GovernorBuilder {
    fn new(config: Config) -> Self {
        Self {
            config,
            store: None,
            pending: None,
            pricing: None,
            flags: None,
            authorizer: None,
            reconfigurator: None,
            codec: None,
            shared: None,
        }
    }

    /// Use one backend for the record, the pending area and pricing
    pub fn state<S>(mut self, state: Arc<S>) -> Self
    where
        S: StateStore + 'static,
    {
        self.shared = Some(state.clone() as Arc<dyn StateStore>);
        self.store = Some(state.clone() as Arc<dyn ConfigStore>);
        self.pending = Some(state.clone() as Arc<dyn PendingStore>);
        self.pricing = Some(state as Arc<dyn PricingStore>);
        self
    }

    pub fn config_store(mut self, store: Arc<dyn ConfigStore>) -> Self {
        self.shared = None;
        self.store = Some(store);
        self
    }

    pub fn pending_store(mut self, pending: Arc<dyn PendingStore>) -> Self {
        self.shared = None;
        self.pending = Some(pending);
        self
    }

    pub fn pricing_store(mut self, pricing: Arc<dyn PricingStore>) -> Self {
        self.pricing = Some(pricing);
        self
    }

    pub fn flags(mut self, flags: Arc<dyn FeatureFlags>) -> Self {
        self.flags = Some(flags);
        self
    }

    pub fn authorizer(mut self, authorizer: Arc<dyn Authorizer>) -> Self {
        self.authorizer = Some(authorizer);
        self
    }

    pub fn reconfigurator(mut self, reconfigurator: Arc<dyn Reconfigurator>) -> Self {
        self.reconfigurator = Some(reconfigurator);
        self
    }

    pub fn codec(mut self, codec: Arc<dyn BlobCodec>) -> Self {
        self.codec = Some(codec);
        self
    }

    pub fn build(self) -> Result<Governor> {
        self.config.validate()?;

        let fallback = Arc::new(MemoryStore::new());
        let shared = match (&self.shared, &self.store, &self.pending) {
            (Some(shared), _, _) => Some(shared.clone()),
            (None, None, None) => Some(fallback.clone() as Arc<dyn StateStore>),
            _ => None,
        };
        let store = self
            .store
            .unwrap_or_else(|| fallback.clone() as Arc<dyn ConfigStore>);
        let pending = self
            .pending
            .unwrap_or_else(|| fallback.clone() as Arc<dyn PendingStore>);
        let pricing = self
            .pricing
            .unwrap_or_else(|| fallback as Arc<dyn PricingStore>);

        let config = self.config;
        let flags = self.flags.unwrap_or_else(|| {
            Arc::new(ModeSwitch::new(config.deferred_mode)) as Arc<dyn FeatureFlags>
        });
        let authorizer = self.authorizer.unwrap_or_else(|| {
            Arc::new(OwnerAuthorizer::new(Authority::new(config.owner.clone())))
                as Arc<dyn Authorizer>
        });
        let (reconfigurator, signals) = match self.reconfigurator {
            Some(injected) => (injected, None),
            None => {
                let signals = Arc::new(ChannelReconfigurator::new());
                (signals.clone() as Arc<dyn Reconfigurator>, Some(signals))
            }
        };
        let codec = self.codec.unwrap_or_else(|| {
            Arc::new(BincodeCodec::new(config.max_blob_size)) as Arc<dyn BlobCodec>
        });

        Ok(Governor {
            config,
            store,
            pending,
            pricing,
            flags,
            authorizer,
            reconfigurator,
            codec,
            shared,
            signals,
            write_lock: Mutex::new(()),
        })
    }
}
