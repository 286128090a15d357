//! Demo modules and templates the command-line host ships with.
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use workbench_core::channels::{ChannelDefinition, ReceiverDefinition};
use workbench_core::dashboard::{LayoutBox, Template, TemplateModuleInstance};
use workbench_core::module_system::{
    ComponentLoader, InterfaceInitialization, LoaderMap, ModuleCategory, ModuleComponent,
    ModuleComponents, ModuleDefinition, ModuleDevState, ModuleLoader, ModuleSerialization,
    ModuleStateStore, ModuleSystemError, SyncSettingKey,
};
use workbench_core::{Result, Workbench};

/// Textual stand-in for a rendered component.
#[derive(Debug)]
struct SummaryComponent {
    name: String,
    keys: &'static [&'static str],
}

impl ModuleComponent for SummaryComponent {
    fn name(&self) -> &str {
        &self.name
    }

    fn render_summary(&self, state: &ModuleStateStore) -> String {
        let fields: Vec<String> = self
            .keys
            .iter()
            .map(|key| {
                let value = state.get_value(&key.to_string()).unwrap_or(Value::Null);
                format!("{key}={value}")
            })
            .collect();
        format!("{}: {}", self.name, fields.join(", "))
    }
}

fn components(module: &str, keys: &'static [&'static str]) -> ModuleComponents {
    ModuleComponents {
        view: Arc::new(SummaryComponent {
            name: format!("{module} view"),
            keys,
        }),
        settings: Arc::new(SummaryComponent {
            name: format!("{module} settings"),
            keys,
        }),
    }
}

const MAP_KEYS: &[&str] = &["attribute", "colorScale"];
const SERIES_KEYS: &[&str] = &["vector", "resampling"];
const DISTRIBUTION_KEYS: &[&str] = &["bins"];

/// Resolves demo components and logs lookups that come up empty.
#[derive(Debug)]
pub struct DemoLoader {
    loaders: LoaderMap,
}

impl DemoLoader {
    pub fn new() -> Self {
        let loaders = LoaderMap::new()
            .with("MapMatrix", || async { Ok(components("MapMatrix", MAP_KEYS)) })
            .with("TimeSeries", || async { Ok(components("TimeSeries", SERIES_KEYS)) })
            .with("Distribution", || async {
                Ok(components("Distribution", DISTRIBUTION_KEYS))
            });
        Self { loaders }
    }
}

#[async_trait]
impl ModuleLoader for DemoLoader {
    async fn resolve(&self, module_name: &str) -> Option<ComponentLoader> {
        let loader = self.loaders.resolve(module_name).await;
        if loader.is_none() {
            log::warn!("No component loader available for '{}'", module_name);
        }
        loader
    }
}

fn definitions() -> std::result::Result<Vec<ModuleDefinition>, ModuleSystemError> {
    Ok(vec![
        ModuleDefinition::builder("MapMatrix")
            .default_title("Map matrix")
            .description("Grid of maps, one per realization")
            .category(ModuleCategory::Main)
            .state("attribute", json!("depth"))
            .state("colorScale", json!("viridis"))
            .sync_settings([SyncSettingKey::Ensemble, SyncSettingKey::Surface, SyncSettingKey::CameraPosition])
            .channel(ChannelDefinition::new("surface", "Surface statistics", "surface"))
            .settings_to_view(InterfaceInitialization::new().mirror("attribute", "attribute"))
            .serialization(ModuleSerialization::json_keys(MAP_KEYS))
            .build()?,
        ModuleDefinition::builder("TimeSeries")
            .default_title("Time series")
            .description("Simulated vectors over time")
            .category(ModuleCategory::Main)
            .state("vector", json!("FOPT"))
            .state("resampling", json!("monthly"))
            .sync_settings([SyncSettingKey::Ensemble, SyncSettingKey::Date, SyncSettingKey::TimeSeries])
            .channel(ChannelDefinition::new("series", "Vector values", "timeseries"))
            .settings_to_view(
                InterfaceInitialization::new()
                    .mirror("vector", "vector")
                    .derive("label", &["vector", "resampling"], |store| {
                        let vector = store.get_value(&"vector".to_string()).unwrap_or(Value::Null);
                        let resampling = store
                            .get_value(&"resampling".to_string())
                            .unwrap_or(Value::Null);
                        json!(format!("{vector} ({resampling})"))
                    }),
            )
            .serialization(ModuleSerialization::json_keys(SERIES_KEYS))
            .build()?,
        ModuleDefinition::builder("Distribution")
            .default_title("Distribution")
            .description("Histogram of incoming channel data")
            .category(ModuleCategory::Sub)
            .dev_state(ModuleDevState::Beta)
            .state("bins", json!(20))
            .receiver(ReceiverDefinition::new("values", "Values", ["timeseries", "surface"]).multi_contents())
            .serialization(ModuleSerialization::json_keys(DISTRIBUTION_KEYS))
            .build()?,
        // Declared without a loader: instances show the failed-import tile
        ModuleDefinition::builder("WellLog")
            .default_title("Well log")
            .description("Log curves along a wellbore")
            .category(ModuleCategory::Main)
            .dev_state(ModuleDevState::Dev)
            .sync_settings([SyncSettingKey::Wellbore])
            .build()?,
    ])
}

fn templates() -> Vec<Template> {
    vec![Template {
        name: "Ensemble overview".to_string(),
        description: "Map matrix next to a time series, both following the ensemble".to_string(),
        module_instances: vec![
            TemplateModuleInstance {
                module_name: "MapMatrix".to_string(),
                layout: LayoutBox::new(0.0, 0.0, 0.5, 1.0),
                synced_settings: vec![SyncSettingKey::Ensemble],
                initial_state: None,
            },
            TemplateModuleInstance {
                module_name: "TimeSeries".to_string(),
                layout: LayoutBox::new(0.5, 0.0, 0.5, 1.0),
                synced_settings: vec![SyncSettingKey::Ensemble, SyncSettingKey::Date],
                initial_state: Some(json!({ "vector": "FGPT" })),
            },
        ],
    }]
}

/// Register every demo module and template.
pub fn register(workbench: &Workbench) -> Result<()> {
    for definition in definitions()? {
        workbench.register_module(definition)?;
    }
    for template in templates() {
        workbench.register_template(template);
    }
    Ok(())
}
