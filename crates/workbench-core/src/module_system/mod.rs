//! # Workbench Core Module System
//!
//! Modules are the pluggable units of the workbench. This subsystem covers
//! their whole life:
//!
//! - **[`definition`]**: the [`ModuleDefinition`] a module registers with (state
//!   schema, channels, sync keys, interfaces, serialization).
//! - **[`registry`]**: the [`ModuleRegistry`], mapping names to [`Module`]s and
//!   standing in a placeholder for unknown names.
//! - **[`module`]**: the import state machine
//!   `NotImported -> Importing -> Imported | Failed`, run once per module.
//! - **[`instance`]**: [`ModuleInstance`], a live module on a dashboard, with its
//!   channel manager, status controller and (de)serialization.
//! - **[`loader`]**: the [`ModuleLoader`] collaborator and the [`LoaderMap`]
//!   capability map filled at startup.
pub mod definition;
pub mod error;
pub mod instance;
pub mod interface;
pub mod loader;
pub mod module;
pub mod registry;
pub mod status;
pub mod sync;

pub use definition::{
    InterfaceInitialization, ModuleCategory, ModuleDefinition, ModuleDefinitionBuilder,
    ModuleDevState, ModuleSerialization, ModuleStateStore,
};
pub use error::ModuleSystemError;
pub use instance::{
    InstanceTile, ModuleInstance, ModuleInstanceFullState, ModuleInstanceSnapshot,
    ModuleInstanceTopic,
};
pub use interface::UniDirectionalInterface;
pub use loader::{ComponentLoader, LoaderMap, ModuleComponent, ModuleComponents, ModuleLoader};
pub use module::{ImportState, Module};
pub use registry::{ModuleLookup, ModuleRegistry};
pub use status::{MessageSeverity, StatusController, StatusMessage, StatusSnapshot, StatusSource, StatusTopic};
pub use sync::SyncSettingKey;

#[cfg(test)]
mod tests;
