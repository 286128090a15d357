//! # Workbench Core Dashboards
//!
//! A [`Dashboard`] owns module instances, their layout slots and the active
//! selection, and converts all of it to and from [`SerializedDashboard`].
//! Instance state slices are held in [`InstanceStateStores`]; ready-made
//! arrangements come from the [`TemplateRegistry`].
#[allow(clippy::module_inception)]
pub mod dashboard;
pub mod error;
pub mod layout;
pub mod persisted;
pub mod stores;
pub mod template;

pub use dashboard::{Dashboard, DashboardSnapshot, DashboardTopic};
pub use error::DashboardError;
pub use layout::{LayoutBox, LayoutElement};
pub use persisted::{LayoutInfo, SerializedDashboard, SerializedModuleInstance};
pub use stores::InstanceStateStores;
pub use template::{Template, TemplateModuleInstance, TemplateRegistry};
