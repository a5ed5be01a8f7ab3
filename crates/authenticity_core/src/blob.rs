//! crates/authenticity_core/src/blob.rs
//!
//! JSON encoding of the whole-store blobs written to the key-value store.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{StoreError, StoreResult};
use crate::ports::KeyValueStore;

/// Reads and decodes the blob under `key`. `Ok(None)` when nothing is stored.
pub(crate) async fn load<T: DeserializeOwned>(
    storage: &dyn KeyValueStore,
    key: &str,
) -> StoreResult<Option<T>> {
    match storage.get(key).await? {
        Some(raw) => serde_json::from_str(&raw)
            .map(Some)
            .map_err(|source| StoreError::Corrupt {
                key: key.to_string(),
                source,
            }),
        None => Ok(None),
    }
}

/// Encodes `value` and overwrites the blob under `key`.
pub(crate) async fn save<T: Serialize + ?Sized>(
    storage: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> StoreResult<()> {
    let raw = serde_json::to_string(value).map_err(|source| StoreError::Corrupt {
        key: key.to_string(),
        source,
    })?;
    storage.set(key, &raw).await?;
    Ok(())
}
