use std::fmt::{self, Debug};

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::kernel::error::Result;
use crate::storage::error::StorageSystemError;

/// Trait for the string key-value backends the workbench persists into
pub trait KeyValueStore: Send + Sync + Debug {
    /// Get the name of this store
    fn name(&self) -> &str;

    /// Read the raw value of a key, `None` if it was never written
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a raw value, replacing any previous one
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove a key. Removing a missing key is not an error
    fn remove(&self, key: &str) -> Result<()>;
}

/// Keys the workbench writes into its [`KeyValueStore`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PersistedKey {
    Layout,
    ActiveDashboardId,
    ActiveModuleInstanceId,
    GuiState(String),
}

impl PersistedKey {
    pub fn as_key(&self) -> String {
        match self {
            PersistedKey::Layout => "layout".to_string(),
            PersistedKey::ActiveDashboardId => "activeDashboardId".to_string(),
            PersistedKey::ActiveModuleInstanceId => "activeModuleInstanceId".to_string(),
            PersistedKey::GuiState(name) => format!("gui-state.{name}"),
        }
    }
}

impl fmt::Display for PersistedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_key())
    }
}

/// Read and decode a JSON value, falling back to `default` on any failure.
///
/// A missing key is silent. Read errors and malformed JSON are logged.
pub fn read_or_default<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &PersistedKey,
    default: T,
) -> T {
    let raw = match store.get(&key.as_key()) {
        Ok(Some(raw)) => raw,
        Ok(None) => return default,
        Err(e) => {
            log::warn!("Failed to read '{}' from {}: {}. Using default.", key, store.name(), e);
            return default;
        }
    };
    match serde_json::from_str(&raw) {
        Ok(value) => value,
        Err(e) => {
            log::warn!("Stored value for '{}' is not valid: {}. Using default.", key, e);
            default
        }
    }
}

/// Encode `value` as JSON and write it under `key`.
pub fn write_json<T: Serialize + ?Sized>(
    store: &dyn KeyValueStore,
    key: &PersistedKey,
    value: &T,
) -> Result<()> {
    let raw = serde_json::to_string(value)
        .map_err(|e| StorageSystemError::serialization("json", e))?;
    store.set(&key.as_key(), &raw)
}
