//! Fixtures shared by the unit tests of several subsystems.
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde_json::{json, Value};

use crate::channels::{ChannelDefinition, ReceiverDefinition};
use crate::module_system::{
    InterfaceInitialization, LoaderMap, ModuleCategory, ModuleComponent, ModuleComponents,
    ModuleDefinition, ModuleSerialization, ModuleStateStore, SyncSettingKey,
};

#[derive(Debug)]
pub struct StaticComponent {
    name: String,
}

impl ModuleComponent for StaticComponent {
    fn name(&self) -> &str {
        &self.name
    }

    fn render_summary(&self, state: &ModuleStateStore) -> String {
        format!("{} {}", self.name, Value::Object(state.to_json_object()))
    }
}

pub fn components(module: &str) -> ModuleComponents {
    ModuleComponents {
        view: Arc::new(StaticComponent {
            name: format!("{module}View"),
        }),
        settings: Arc::new(StaticComponent {
            name: format!("{module}Settings"),
        }),
    }
}

/// Loaders for `names` that count their invocations.
pub fn counting_loader(names: &[&str]) -> (LoaderMap, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut map = LoaderMap::new();
    for name in names {
        let calls = calls.clone();
        let module = name.to_string();
        map.insert(*name, move || {
            let calls = calls.clone();
            let module = module.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                tokio::task::yield_now().await;
                Ok(components(&module))
            }
        });
    }
    (map, calls)
}

/// A module with state, an interface, serialization, sync keys and channels.
pub fn plot_definition(name: &str) -> ModuleDefinition {
    ModuleDefinition::builder(name)
        .default_title("Plot")
        .category(ModuleCategory::Main)
        .state("zoom", json!(1))
        .state("color", json!("red"))
        .sync_settings([SyncSettingKey::Ensemble, SyncSettingKey::Date])
        .channel(ChannelDefinition::new("series", "Series", "timeseries"))
        .receiver(ReceiverDefinition::new("input", "Input", ["timeseries"]))
        .settings_to_view(
            InterfaceInitialization::new()
                .mirror("zoom", "zoom")
                .derive("zoomLabel", &["zoom"], |store| {
                    let zoom = store.get_value(&"zoom".to_string()).unwrap_or(Value::Null);
                    json!(format!("x{zoom}"))
                }),
        )
        .serialization(ModuleSerialization::json_keys(&["zoom", "color"]))
        .build()
        .expect("valid test definition")
}

/// A module with no state or extras.
pub fn bare_definition(name: &str) -> ModuleDefinition {
    ModuleDefinition::builder(name)
        .build()
        .expect("valid test definition")
}
