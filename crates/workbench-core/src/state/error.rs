//! # Workbench Core State Store Errors
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StateStoreError {
    #[error("State key '{key}' was never declared in the store schema")]
    UnknownKey { key: String },

    #[error("Value for state key '{key}' does not have the expected shape: {source}")]
    TypeMismatch {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

impl StateStoreError {
    pub fn unknown_key(key: &impl std::fmt::Debug) -> Self {
        StateStoreError::UnknownKey {
            key: format!("{key:?}"),
        }
    }
}
