//! # Workbench Core Sortable Errors
//!
//! [`SortableError`] reports misuse of the scene graph. Rejected drops are
//! not errors: they just clear the hover state.
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SortableError {
    #[error("Sortable node '{id}' is already registered")]
    DuplicateNode { id: String },

    #[error("Sortable node '{id}' is not registered")]
    UnknownNode { id: String },

    #[error("Sortable node '{id}' is not a group and cannot hold children")]
    NotAGroup { id: String },

    #[error("Cannot move '{id}' into its own subtree '{parent}'")]
    CyclicMove { id: String, parent: String },

    #[error("Cannot start a drag on '{id}' while another drag is active")]
    DragInProgress { id: String },
}
