//! # Workbench Core Kernel
//!
//! The application root and the crate-wide plumbing:
//!
//! - **Bootstrapping**: [`Workbench`](bootstrap::Workbench) owns the module and
//!   template registries, the shared services, the GUI broker, the key-value
//!   store and the dashboards, and saves and restores them.
//! - **Constants**: defaults for names, paths, logging and drag tuning.
//! - **Errors**: the aggregate [`Error`](error::Error) and the `Result` alias.
pub mod bootstrap;
pub mod constants;
pub mod error;

pub use bootstrap::Workbench;
pub use error::{Error, Result};

#[cfg(test)]
mod tests;
