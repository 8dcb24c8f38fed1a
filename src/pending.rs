//! Typed access to the pending-configuration area
//!
//! `PendingStore` deals in raw payloads keyed by tag; these helpers key by
//! the `OnChainConfig` type tag and serialize with bincode.

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Result, ScheduleError};
use crate::schedule::OnChainConfig;
use crate::store::PendingStore;

/// Stage `value` for the next epoch, replacing any earlier candidate of its type
pub fn upsert<T: OnChainConfig + Serialize>(store: &dyn PendingStore, value: &T) -> Result<()> {
    let payload =
        bincode::serialize(value).map_err(|e| ScheduleError::Serialization(e.to_string()))?;
    store.stage(T::TYPE_TAG, Bytes::from(payload))
}

/// Read the staged candidate of type `T`, if any
pub fn peek<T: OnChainConfig + DeserializeOwned>(store: &dyn PendingStore) -> Result<Option<T>> {
    match store.staged(T::TYPE_TAG)? {
        Some(payload) => bincode::deserialize(&payload)
            .map(Some)
            .map_err(|e| ScheduleError::Serialization(format!("{}: {}", T::TYPE_TAG, e))),
        None => Ok(None),
    }
}

/// Drop the staged candidate of type `T`
pub fn clear<T: OnChainConfig>(store: &dyn PendingStore) -> Result<()> {
    store.clear(T::TYPE_TAG)
}
