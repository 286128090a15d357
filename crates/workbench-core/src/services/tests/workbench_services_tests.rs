use std::sync::{Arc, Mutex};

use serde_json::{json, Value};

use crate::event::{make_snapshot_getter, PublishSubscribe};
use crate::module_system::{Module, ModuleInstance, SyncSettingKey};
use crate::services::{GlobalTopic, WorkbenchServices};
use crate::utils::testing::{counting_loader, plot_definition};

fn instances() -> (Arc<ModuleInstance>, Arc<ModuleInstance>) {
    let (loader, _) = counting_loader(&["Plot"]);
    let module = Module::new(plot_definition("Plot"), Arc::new(loader));
    let store = || Arc::new(module.definition().make_state_store());
    (module.make_instance("a", store()), module.make_instance("b", store()))
}

#[test]
fn test_publish_and_read_global_data() {
    let services = Arc::new(WorkbenchServices::new());
    let getter = make_snapshot_getter(&services, GlobalTopic::HoverTimestamp);
    assert_eq!(getter.get().unwrap().value, None);

    services.publish_global_data(GlobalTopic::HoverTimestamp, json!(1_700_000_000), None);
    assert_eq!(
        services.get_global_data(GlobalTopic::HoverTimestamp),
        Some(json!(1_700_000_000))
    );
    assert_eq!(getter.get().unwrap().value, Some(json!(1_700_000_000)));
}

#[test]
fn test_same_value_does_not_notify() {
    let services = WorkbenchServices::new();
    let hits = Arc::new(Mutex::new(0));
    let h = hits.clone();
    let _sub = services.subscribe(GlobalTopic::HoverTimestamp, move || {
        *h.lock().unwrap() += 1;
    });
    services.publish_global_data(GlobalTopic::HoverTimestamp, json!(5), None);
    services.publish_global_data(GlobalTopic::HoverTimestamp, json!(5), None);
    assert_eq!(*hits.lock().unwrap(), 1);
}

#[tokio::test]
async fn test_synced_publish_requires_active_key() {
    let services = WorkbenchServices::new();
    let (a, _) = instances();
    let key = SyncSettingKey::Ensemble;

    assert!(!services.publish_synced(&a, key, json!("ens-1")));
    assert_eq!(services.get_global_data(GlobalTopic::Synced(key)), None);

    a.add_synced_setting(key).unwrap();
    assert!(services.publish_synced(&a, key, json!("ens-1")));
    assert_eq!(
        services.get_global_data(GlobalTopic::Synced(key)),
        Some(json!("ens-1"))
    );
}

#[tokio::test]
async fn test_synced_subscription_ignores_own_publish() {
    let services = Arc::new(WorkbenchServices::new());
    let (a, b) = instances();
    let key = SyncSettingKey::Date;
    a.add_synced_setting(key).unwrap();
    b.add_synced_setting(key).unwrap();

    let seen_by_a: Arc<Mutex<Vec<Value>>> = Arc::default();
    let seen = seen_by_a.clone();
    let sub = services.subscribe_synced(&a, key, move |value| {
        seen.lock().unwrap().push(value.clone());
    });

    services.publish_synced(&a, key, json!("2020-01-01"));
    services.publish_synced(&b, key, json!("2021-06-01"));
    assert_eq!(*seen_by_a.lock().unwrap(), vec![json!("2021-06-01")]);

    // Deactivating the key on the receiving side silences it
    a.remove_synced_setting(key);
    services.publish_synced(&b, key, json!("2022-01-01"));
    assert_eq!(seen_by_a.lock().unwrap().len(), 1);

    sub.unsubscribe();
    a.add_synced_setting(key).unwrap();
    services.publish_synced(&b, key, json!("2023-01-01"));
    assert_eq!(seen_by_a.lock().unwrap().len(), 1);
}
