//! # Workbench Core Services
//!
//! Application-wide state shared between module instances:
//!
//! - **[`workbench_services`]**: [`WorkbenchServices`], the global topics that
//!   instances publish to and read from, with sync-key gating.
//! - **[`gui`]**: [`GuiMessageBroker`], GUI state backed by a state store with
//!   persisted keys, plus push-model [`GuiEvent`]s.
pub mod gui;
pub mod workbench_services;

pub use gui::{GuiEvent, GuiEventKind, GuiMessageBroker, GuiState};
pub use workbench_services::{GlobalData, GlobalTopic, WorkbenchServices};

#[cfg(test)]
mod tests;
