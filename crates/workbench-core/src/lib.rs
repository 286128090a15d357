//! Core of the visualization workbench: module lifecycle, dashboards, data
//! channels, shared services and the drag-reorder engine.
pub mod channels;
pub mod dashboard;
pub mod event;
pub mod kernel;
pub mod module_system;
pub mod services;
pub mod sortable;
pub mod state;
pub mod storage;
pub mod utils;

// Re-export the types the host binary and module authors reach for most
pub use dashboard::{Dashboard, LayoutBox, Template};
pub use event::{PublishSubscribe, Unsubscribe};
pub use kernel::Workbench;
pub use kernel::error::{Error as WorkbenchError, Result};
pub use module_system::{
    ImportState, LoaderMap, ModuleComponent, ModuleComponents, ModuleDefinition, ModuleRegistry,
};
pub use sortable::SortableEngine;
pub use storage::{KeyValueStore, WorkbenchConfig};
