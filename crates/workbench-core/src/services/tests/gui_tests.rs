use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use serde_json::json;

use crate::event::{EventResult, EventSystemError};
use crate::kernel::error::Error;
use crate::services::{GuiEvent, GuiEventKind, GuiMessageBroker, GuiState};
use crate::storage::{write_json, KeyValueStore, MemoryKeyValueStore};

#[test]
fn test_defaults_without_storage() {
    let broker = GuiMessageBroker::new();
    assert_eq!(
        broker.get_state(GuiState::SettingsPanelWidthInPercent).unwrap(),
        json!(20)
    );
    assert_eq!(
        broker.get_state(GuiState::EditDataChannelConnections).unwrap(),
        json!(false)
    );
}

#[test]
fn test_persisted_keys_round_trip_through_storage() {
    let storage = Arc::new(MemoryKeyValueStore::new());
    let broker = GuiMessageBroker::with_storage(storage.clone());

    assert!(broker
        .set_state(GuiState::SettingsPanelWidthInPercent, json!(35))
        .unwrap());
    broker
        .set_state(GuiState::DataChannelConnectionLayerVisible, json!(true))
        .unwrap();

    assert_eq!(
        storage.get("gui-state.settingsPanelWidthInPercent").unwrap(),
        Some("35".to_string())
    );
    assert_eq!(
        storage.get("gui-state.dataChannelConnectionLayerVisible").unwrap(),
        None
    );

    let reopened = GuiMessageBroker::with_storage(storage);
    assert_eq!(
        reopened.get_state(GuiState::SettingsPanelWidthInPercent).unwrap(),
        json!(35)
    );
    assert_eq!(
        reopened
            .get_state(GuiState::DataChannelConnectionLayerVisible)
            .unwrap(),
        json!(false)
    );
}

#[test]
fn test_malformed_stored_value_falls_back_to_default() {
    let storage = Arc::new(MemoryKeyValueStore::new());
    storage
        .set("gui-state.leftDrawerContent", "{not json")
        .unwrap();
    write_json(
        storage.as_ref(),
        &GuiState::RightDrawerContent.persisted_key(),
        &json!("Templates"),
    )
    .unwrap();

    let broker = GuiMessageBroker::with_storage(storage);
    assert_eq!(
        broker.get_state(GuiState::LeftDrawerContent).unwrap(),
        json!("ModuleSettings")
    );
    assert_eq!(
        broker.get_state(GuiState::RightDrawerContent).unwrap(),
        json!("Templates")
    );
}

#[test]
fn test_state_subscription_catches_up() {
    let broker = GuiMessageBroker::new();
    let calls = Arc::new(AtomicU32::new(0));
    let c = calls.clone();
    let _sub = broker
        .subscribe_to_state(GuiState::LeftDrawerContent, move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();
    broker
        .set_state(GuiState::LeftDrawerContent, json!("ModuleSettings"))
        .unwrap();
    broker
        .set_state(GuiState::LeftDrawerContent, json!("SyncSettings"))
        .unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn test_event_handlers() {
    let broker = GuiMessageBroker::new();
    let removed = Arc::new(std::sync::Mutex::new(Vec::new()));
    let r = removed.clone();
    let id = broker.register_handler(GuiEventKind::RemoveModuleInstanceRequest, move |event| {
        if let GuiEvent::RemoveModuleInstanceRequest { module_instance_id } = event {
            r.lock().unwrap().push(module_instance_id.clone());
        }
        EventResult::Continue
    });

    broker.publish_event(&GuiEvent::RemoveModuleInstanceRequest {
        module_instance_id: "i1".to_string(),
    });
    broker.publish_event(&GuiEvent::DataChannelConnectionsChange);
    broker.queue_event(GuiEvent::RemoveModuleInstanceRequest {
        module_instance_id: "i2".to_string(),
    });
    assert_eq!(removed.lock().unwrap().len(), 1);
    assert_eq!(broker.process_events(), 1);
    assert_eq!(*removed.lock().unwrap(), vec!["i1", "i2"]);

    broker.unregister_handler(id).unwrap();
    let err = broker.unregister_handler(id).unwrap_err();
    assert!(matches!(
        err,
        Error::EventSystem(EventSystemError::HandlerNotFound { .. })
    ));
}
