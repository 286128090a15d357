//! # Workbench Core Module System Errors
//!
//! [`ModuleSystemError`] covers module registration, definition validation,
//! instance lifecycle ordering and state (de)serialization.
use thiserror::Error;

use crate::module_system::sync::SyncSettingKey;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModuleSystemError {
    #[error("Module '{name}' is already registered")]
    AlreadyRegistered { name: String },

    #[error("Module '{name}' is not registered")]
    NotRegistered { name: String },

    #[error("Invalid definition for module '{module}': {reason}")]
    InvalidDefinition { module: String, reason: String },

    #[error("Module instance '{instance_id}' was accessed before it was initialized")]
    NotInitialized { instance_id: String },

    #[error("Module '{module}' does not declare a '{interface}' interface")]
    InterfaceNotDeclared { module: String, interface: String },

    #[error("Module '{module}' does not support syncing '{key}'")]
    SyncSettingNotSupported { module: String, key: SyncSettingKey },

    #[error("Failed to restore state of module '{module}': {reason}")]
    Deserialization { module: String, reason: String },

    #[error("Import of module '{module}' failed: {reason}")]
    ImportFailed { module: String, reason: String },
}
