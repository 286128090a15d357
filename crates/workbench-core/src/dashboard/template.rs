use std::collections::BTreeMap;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::dashboard::layout::LayoutBox;
use crate::module_system::SyncSettingKey;
use crate::utils::lock;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateModuleInstance {
    pub module_name: String,
    pub layout: LayoutBox,
    #[serde(default)]
    pub synced_settings: Vec<SyncSettingKey>,
    /// Passed to the module's state deserializer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_state: Option<Value>,
}

/// A ready-made dashboard arrangement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub name: String,
    pub description: String,
    pub module_instances: Vec<TemplateModuleInstance>,
}

#[derive(Debug, Default)]
pub struct TemplateRegistry {
    templates: Mutex<BTreeMap<String, Template>>,
}

impl TemplateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `template`, replacing one with the same name.
    pub fn register(&self, template: Template) {
        log::debug!("Registered template '{}'", template.name);
        lock(&self.templates).insert(template.name.clone(), template);
    }

    pub fn get(&self, name: &str) -> Option<Template> {
        lock(&self.templates).get(name).cloned()
    }

    /// Templates sorted by name.
    pub fn templates(&self) -> Vec<Template> {
        lock(&self.templates).values().cloned().collect()
    }
}
