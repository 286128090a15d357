//! # Workbench Core Kernel Errors
//!
//! Defines [`Error`], the crate-wide error type. Every subsystem owns a typed
//! error enum and converts into this one through `?`.
use std::result::Result as StdResult;

use thiserror::Error as ThisError;

use crate::channels::error::ChannelError;
use crate::dashboard::error::DashboardError;
use crate::event::error::EventSystemError;
use crate::module_system::error::ModuleSystemError;
use crate::sortable::error::SortableError;
use crate::state::error::StateStoreError;
use crate::storage::error::StorageSystemError;

/// Custom error type for the workbench
#[derive(Debug, ThisError)]
pub enum Error {
    /// Event system error
    #[error("Event system error: {0}")]
    EventSystem(#[from] EventSystemError),

    /// State store error
    #[error("State store error: {0}")]
    StateStore(#[from] StateStoreError),

    /// Module system error
    #[error("Module system error: {0}")]
    ModuleSystem(#[from] ModuleSystemError),

    /// Data channel error
    #[error("Data channel error: {0}")]
    Channel(#[from] ChannelError),

    /// Dashboard error
    #[error("Dashboard error: {0}")]
    Dashboard(#[from] DashboardError),

    /// Specific, typed storage system error
    #[error("Storage system error: {0}")]
    StorageSystem(#[from] StorageSystemError),

    /// Sortable list error
    #[error("Sortable list error: {0}")]
    Sortable(#[from] SortableError),

    /// Generic error with message
    #[error("Error: {0}")]
    Other(String),
}

/// Result type for workbench operations
pub type Result<T> = StdResult<T, Error>;

impl From<String> for Error {
    fn from(msg: String) -> Self {
        Error::Other(msg)
    }
}

impl From<&str> for Error {
    fn from(msg: &str) -> Self {
        Error::Other(msg.to_string())
    }
}
