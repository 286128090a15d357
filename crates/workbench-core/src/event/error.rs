//! # Workbench Core Event System Errors
//!
//! Defines [`EventSystemError`], raised when a pull-model read cannot be
//! served or a push-model handler cannot be found.
use thiserror::Error;

use crate::event::HandlerId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EventSystemError {
    #[error("Snapshot requested for topic '{topic}' after its publisher was dropped")]
    PublisherDropped { topic: String },

    #[error("No event handler registered with ID {id}")]
    HandlerNotFound { id: HandlerId },
}
