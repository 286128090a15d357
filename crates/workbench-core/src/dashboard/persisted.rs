use serde::{Deserialize, Serialize};

use crate::dashboard::layout::{LayoutBox, LayoutElement};
use crate::module_system::ModuleInstanceFullState;

/// Geometry of a persisted instance. Missing flags read as `false`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutInfo {
    #[serde(flatten)]
    pub layout: LayoutBox,
    #[serde(default)]
    pub minimized: bool,
    #[serde(default)]
    pub maximized: bool,
}

impl LayoutInfo {
    pub fn from_element(element: &LayoutElement) -> Self {
        Self {
            layout: element.layout,
            minimized: element.is_minimized(),
            maximized: element.is_maximized(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializedModuleInstance {
    #[serde(flatten)]
    pub state: ModuleInstanceFullState,
    pub layout_info: LayoutInfo,
}

/// Persisted dashboard document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializedDashboard {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub module_instances: Vec<SerializedModuleInstance>,
}
