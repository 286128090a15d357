//! # Workbench Core Dashboard Errors
//!
//! [`DashboardError`] covers the integrity failures of dashboard
//! orchestration: persisted content naming unknown modules or repeating an instance id, instances without
//! a layout slot, and lookups of dashboards, instances or templates that do
//! not exist.
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DashboardError {
    #[error("Persisted dashboard '{dashboard_id}' references unregistered module '{module_name}'")]
    UnregisteredModule {
        dashboard_id: String,
        module_name: String,
    },

    #[error("Persisted dashboard '{dashboard_id}' lists module instance '{instance_id}' more than once")]
    DuplicateInstanceId {
        dashboard_id: String,
        instance_id: String,
    },

    #[error("Module instance '{instance_id}' has no layout element")]
    MissingLayoutElement { instance_id: String },

    #[error("Module instance '{instance_id}' is not part of dashboard '{dashboard_id}'")]
    InstanceNotFound {
        dashboard_id: String,
        instance_id: String,
    },

    #[error("Dashboard '{dashboard_id}' is inconsistent: {reason}")]
    Inconsistent { dashboard_id: String, reason: String },

    #[error("No dashboard with id '{id}'")]
    DashboardNotFound { id: String },

    #[error("No template named '{name}'")]
    TemplateNotFound { name: String },
}
