use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::{json, Value};

use crate::state::{StateKeyOptions, StateKeySpec, StateStore, StateStoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Key {
    Zoom,
    Selection,
}

fn make_store() -> StateStore<Key, Value> {
    StateStore::new([
        StateKeySpec::new(Key::Zoom, json!(1)),
        StateKeySpec::new(Key::Selection, json!({"ids": []}))
            .with_options(StateKeyOptions::deep_compare()),
    ])
}

#[test]
fn test_subscribe_invokes_callback_with_current_value() {
    let store = make_store();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let s = seen.clone();
    let _sub = store
        .subscribe(&Key::Zoom, move |v| s.lock().unwrap().push(v.clone()))
        .unwrap();

    assert_eq!(*seen.lock().unwrap(), vec![json!(1)]);

    store.set_value(&Key::Zoom, json!(2)).unwrap();
    assert_eq!(*seen.lock().unwrap(), vec![json!(1), json!(2)]);
}

#[test]
fn test_subscribers_called_in_subscription_order() {
    let store = make_store();
    let order = Arc::new(Mutex::new(Vec::new()));
    let mut handles = Vec::new();
    for label in ["a", "b", "c"] {
        let o = order.clone();
        handles.push(
            store
                .subscribe(&Key::Zoom, move |_| o.lock().unwrap().push(label))
                .unwrap(),
        );
    }
    order.lock().unwrap().clear();

    store.set_value(&Key::Zoom, json!(5)).unwrap();
    assert_eq!(*order.lock().unwrap(), vec!["a", "b", "c"]);
}

#[test]
fn test_deep_compare_suppresses_equal_values() {
    let store = make_store();
    let calls = Arc::new(AtomicU32::new(0));
    let c = calls.clone();
    let _sub = store
        .subscribe(&Key::Selection, move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();

    let changed = store.set_value(&Key::Selection, json!({"ids": []})).unwrap();
    assert!(!changed);
    assert_eq!(calls.load(Ordering::SeqCst), 1, "only the initial catch-up call");

    let changed = store.set_value(&Key::Selection, json!({"ids": [1]})).unwrap();
    assert!(changed);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn test_without_deep_compare_equal_values_still_notify() {
    let store = make_store();
    let calls = Arc::new(AtomicU32::new(0));
    let c = calls.clone();
    let _sub = store
        .subscribe(&Key::Zoom, move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();

    assert!(store.set_value(&Key::Zoom, json!(1)).unwrap());
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn test_same_shared_value_short_circuits() {
    let store = make_store();
    let current = store.get_shared_value(&Key::Zoom).unwrap();
    assert!(!store.set_shared_value(&Key::Zoom, current).unwrap());
}

#[test]
fn test_unknown_key_fails_fast() {
    let store: StateStore<String, Value> =
        StateStore::new([StateKeySpec::new("known".to_string(), json!(null))]);

    let err = store.get_value(&"missing".to_string()).unwrap_err();
    assert!(matches!(err, StateStoreError::UnknownKey { .. }));
    assert!(store.set_value(&"missing".to_string(), json!(1)).is_err());
    assert!(store.subscribe(&"missing".to_string(), |_| {}).is_err());
}

#[test]
fn test_unsubscribe_stops_notifications() {
    let store = make_store();
    let calls = Arc::new(AtomicU32::new(0));
    let c = calls.clone();
    let sub = store
        .subscribe(&Key::Zoom, move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();
    sub.unsubscribe();
    sub.unsubscribe();

    store.set_value(&Key::Zoom, json!(9)).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(store.subscriber_count(&Key::Zoom), 0);
}

#[test]
fn test_typed_access_and_json_object() {
    let store: StateStore<String, Value> = StateStore::new([
        StateKeySpec::new("count".to_string(), json!(0)),
        StateKeySpec::new("name".to_string(), json!("x")),
    ]);
    store.set_as(&"count".to_string(), &41u32).unwrap();
    let count: u32 = store.get_as(&"count".to_string()).unwrap();
    assert_eq!(count, 41);

    let err = store.get_as::<u32>(&"name".to_string()).unwrap_err();
    assert!(matches!(err, StateStoreError::TypeMismatch { .. }));

    let object = store.to_json_object();
    assert_eq!(Value::Object(object), json!({"count": 41, "name": "x"}));
}

#[test]
fn test_persisted_keys_follow_schema_order() {
    let store: StateStore<&'static str, Value> = StateStore::new([
        StateKeySpec::new("a", json!(1)).with_options(StateKeyOptions::persisted()),
        StateKeySpec::new("b", json!(2)),
        StateKeySpec::new("c", json!(3)).with_options(StateKeyOptions::persisted()),
    ]);
    assert_eq!(store.persisted_keys(), vec!["a", "c"]);
    assert_eq!(store.keys(), &["a", "b", "c"]);
}

#[test]
fn test_subscriber_may_write_other_key() {
    let store = Arc::new(make_store());
    let weak = Arc::downgrade(&store);
    let _sub = store
        .subscribe(&Key::Zoom, move |v| {
            if let Some(store) = weak.upgrade() {
                let _ = store.set_value(&Key::Selection, json!({"zoom": v.clone()}));
            }
        })
        .unwrap();

    store.set_value(&Key::Zoom, json!(3)).unwrap();
    assert_eq!(
        store.get_value(&Key::Selection).unwrap(),
        json!({"zoom": 3})
    );
}
