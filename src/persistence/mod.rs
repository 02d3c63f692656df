//! Save/load persistence
//!
//! Features:
//! - Versioned JSON envelope
//! - Best-effort: unreadable or outdated data falls back to defaults upstream

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::platform::KeyValueStore;

/// Current envelope version
pub const SAVE_VERSION: u32 = 1;

/// Storage failures. Gameplay never depends on these; callers log and move on.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Storage is blocked or full
    #[error("storage unavailable")]
    Unavailable,

    #[error("failed to serialize save data: {0}")]
    Serialize(serde_json::Error),

    #[error("failed to parse save data: {0}")]
    Deserialize(serde_json::Error),

    /// Written by a newer build
    #[error("unsupported save version {found} (expected {expected})")]
    Version { found: u32, expected: u32 },
}

#[derive(Serialize)]
struct EnvelopeRef<'a, T> {
    version: u32,
    data: &'a T,
}

#[derive(Deserialize)]
struct Envelope<T> {
    version: u32,
    data: T,
}

/// Write `value` under `key`
pub fn save_json<T: Serialize>(
    store: &mut dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    let envelope = EnvelopeRef {
        version: SAVE_VERSION,
        data: value,
    };
    let json = serde_json::to_string(&envelope).map_err(StorageError::Serialize)?;
    store.set_item(key, &json)
}

/// Read the value under `key`; `Ok(None)` if nothing was saved
pub fn load_json<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<T>, StorageError> {
    let Some(json) = store.get_item(key) else {
        return Ok(None);
    };
    let envelope: Envelope<T> = serde_json::from_str(&json).map_err(StorageError::Deserialize)?;
    if envelope.version > SAVE_VERSION {
        return Err(StorageError::Version {
            found: envelope.version,
            expected: SAVE_VERSION,
        });
    }
    Ok(Some(envelope.data))
}

/// Load or fall back to `T::default()`, logging anything unreadable
pub fn load_or_default<T: DeserializeOwned + Default>(store: &dyn KeyValueStore, key: &str) -> T {
    match load_json(store, key) {
        Ok(Some(value)) => value,
        Ok(None) => T::default(),
        Err(e) => {
            log::warn!("Ignoring saved '{}': {}", key, e);
            T::default()
        }
    }
}
