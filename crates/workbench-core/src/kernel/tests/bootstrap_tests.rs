use std::sync::Arc;

use serde_json::json;
use tempfile::tempdir;

use crate::dashboard::{DashboardError, LayoutBox, Template, TemplateModuleInstance};
use crate::kernel::bootstrap::Workbench;
use crate::kernel::error::Error;
use crate::module_system::{ImportState, SyncSettingKey};
use crate::services::{GuiEvent, GuiState};
use crate::storage::{write_json, KeyValueStore, MemoryKeyValueStore, PersistedKey, WorkbenchConfig};
use crate::utils::testing::{counting_loader, plot_definition};

fn workbench(storage: Arc<MemoryKeyValueStore>) -> Arc<Workbench> {
    let (loader, _) = counting_loader(&["Plot"]);
    let workbench = Workbench::new(WorkbenchConfig::default(), Arc::new(loader), storage);
    workbench.register_module(plot_definition("Plot")).unwrap();
    workbench
}

#[tokio::test]
async fn test_new_starts_with_one_empty_dashboard() {
    let workbench = workbench(Arc::new(MemoryKeyValueStore::new()));
    assert_eq!(workbench.dashboards().len(), 1);
    let active = workbench.active_dashboard();
    assert_eq!(active.id(), workbench.active_dashboard_id());
    assert!(active.module_instances().is_empty());
}

#[tokio::test]
async fn test_reload_during_import_initializes_new_instances() {
    let storage = Arc::new(MemoryKeyValueStore::new());
    let first = workbench(storage.clone());
    let saved = first
        .active_dashboard()
        .make_and_add_module_instance("Plot", LayoutBox::new(0.0, 0.0, 1.0, 1.0));
    saved.module().wait_until_settled().await;
    first.save().unwrap();

    let second = workbench(storage);
    second.load().unwrap();
    // The first load's instances are still waiting on the import
    second.load().unwrap();

    let instances = second.active_dashboard().module_instances();
    assert_eq!(instances.len(), 1);
    assert_eq!(instances[0].id(), saved.id());
    instances[0].module().wait_until_settled().await;
    assert!(instances[0].is_initialized());
    assert_eq!(instances[0].module().instances().len(), 1);
}

#[tokio::test]
async fn test_load_without_saved_state_falls_back() {
    let workbench = workbench(Arc::new(MemoryKeyValueStore::new()));
    workbench.load().unwrap();
    assert_eq!(workbench.dashboards().len(), 1);
    assert!(workbench.active_dashboard().layout().is_empty());
}

#[tokio::test]
async fn test_save_and_load_round_trip() {
    let storage = Arc::new(MemoryKeyValueStore::new());
    let first = workbench(storage.clone());
    let instance = first
        .active_dashboard()
        .make_and_add_module_instance("Plot", LayoutBox::new(0.0, 0.0, 0.5, 0.5));
    instance.module().wait_until_settled().await;
    instance
        .state_store()
        .set_value(&"zoom".to_string(), json!(4))
        .unwrap();
    let first_page = first.active_dashboard();
    let second_page = first.add_dashboard("Second");
    assert_eq!(first.active_dashboard_id(), second_page.id());
    first.set_active_dashboard(first_page.id()).unwrap();
    first
        .gui_message_broker()
        .set_state(GuiState::SettingsPanelWidthInPercent, json!(30))
        .unwrap();
    first.save().unwrap();

    let second = workbench(storage);
    second.load().unwrap();
    assert_eq!(second.dashboards().len(), 2);
    assert!(second.dashboard(second_page.id()).is_some());
    let active = second.active_dashboard();
    assert_eq!(active.id(), first.active_dashboard_id());
    assert_eq!(active.active_module_instance_id().as_deref(), Some(instance.id()));

    let restored = active.module_instance(instance.id()).unwrap();
    restored.module().wait_until_settled().await;
    assert_eq!(restored.import_state(), ImportState::Imported);
    assert_eq!(
        restored.state_store().get_value(&"zoom".to_string()).unwrap(),
        json!(4)
    );
    assert_eq!(
        second
            .gui_message_broker()
            .get_state(GuiState::SettingsPanelWidthInPercent)
            .unwrap(),
        json!(30)
    );
}

#[tokio::test]
async fn test_load_rejects_unregistered_module() {
    let storage = Arc::new(MemoryKeyValueStore::new());
    let layout = json!([{
        "id": "d1",
        "name": "Broken",
        "moduleInstances": [{
            "id": "i1",
            "name": "Retired",
            "title": "Old",
            "layoutInfo": { "relX": 0.0, "relY": 0.0, "relWidth": 1.0, "relHeight": 1.0 }
        }]
    }]);
    write_json(storage.as_ref(), &PersistedKey::Layout, &layout).unwrap();

    let workbench = workbench(storage);
    let before = workbench.active_dashboard_id();
    let err = workbench.load().unwrap_err();
    assert!(matches!(
        err,
        Error::Dashboard(DashboardError::UnregisteredModule { .. })
    ));
    assert_eq!(workbench.active_dashboard_id(), before);
}

#[tokio::test]
async fn test_corrupt_layout_falls_back_to_empty_dashboard() {
    let storage = Arc::new(MemoryKeyValueStore::new());
    storage.set(&PersistedKey::Layout.as_key(), "[{").unwrap();
    let workbench = workbench(storage);
    workbench.load().unwrap();
    assert_eq!(workbench.dashboards().len(), 1);
}

#[tokio::test]
async fn test_remove_request_event_removes_instance() {
    let workbench = workbench(Arc::new(MemoryKeyValueStore::new()));
    let dashboard = workbench.active_dashboard();
    let instance = dashboard.make_and_add_module_instance("Plot", LayoutBox::full());

    workbench.publish_gui_event(&GuiEvent::RemoveModuleInstanceRequest {
        module_instance_id: instance.id().to_string(),
    });
    assert!(dashboard.module_instances().is_empty());
    assert!(instance.is_unloaded());
}

#[tokio::test]
async fn test_apply_template() {
    let workbench = workbench(Arc::new(MemoryKeyValueStore::new()));
    workbench.register_template(Template {
        name: "Single".to_string(),
        description: "One plot".to_string(),
        module_instances: vec![TemplateModuleInstance {
            module_name: "Plot".to_string(),
            layout: LayoutBox::full(),
            synced_settings: vec![SyncSettingKey::Ensemble],
            initial_state: None,
        }],
    });

    let dashboard = workbench.apply_template("Single").unwrap();
    assert_eq!(workbench.active_dashboard_id(), dashboard.id());
    assert_eq!(workbench.dashboards().len(), 2);
    assert!(dashboard.module_instances()[0].is_synced(SyncSettingKey::Ensemble));

    assert!(matches!(
        workbench.apply_template("Nope").unwrap_err(),
        Error::Dashboard(DashboardError::TemplateNotFound { .. })
    ));
}

#[test]
fn test_open_uses_data_dir() {
    let dir = tempdir().unwrap();
    let config = WorkbenchConfig {
        data_dir: dir.path().to_path_buf(),
        persist_gui_state: false,
        ..WorkbenchConfig::default()
    };
    let (loader, _) = counting_loader(&[]);
    let workbench = Workbench::open(config, Arc::new(loader));
    workbench.save().unwrap();
    assert!(dir.path().join("layout.json").exists());
    assert!(dir.path().join("activeDashboardId.json").exists());
    assert!(!dir.path().join("gui-state.settingsPanelWidthInPercent.json").exists());
}
