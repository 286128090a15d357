use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use serde_json::json;

use crate::channels::{
    ChannelContent, ChannelDefinition, ChannelError, ChannelManager, ReceiverDefinition,
    ReceiverSubscription, ReceiverTopic,
};
use crate::event::PublishSubscribe;

fn publisher() -> ChannelManager {
    let manager = ChannelManager::new("pub-1");
    manager.register_channels([
        ChannelDefinition::new("series", "Time series", "timeseries"),
        ChannelDefinition::new("grid", "Grid", "surface"),
    ]);
    manager
}

fn listener() -> ChannelManager {
    let manager = ChannelManager::new("sub-1");
    manager.register_receivers([
        ReceiverDefinition::new("single", "Single", ["timeseries"]),
        ReceiverDefinition::new("multi", "Multi", ["timeseries", "surface"]).multi_contents(),
    ]);
    manager
}

fn contents() -> Vec<ChannelContent> {
    vec![
        ChannelContent::new("a", "A", json!([1, 2])),
        ChannelContent::new("b", "B", json!([3])),
    ]
}

#[test]
fn test_connect_and_receive_contents() {
    let source = publisher();
    let target = listener();
    source.publish("series", contents()).unwrap();

    target
        .connect("single", &source, "series", vec!["b".into()])
        .unwrap();
    let receiver = target.receiver("single").unwrap();
    assert_eq!(receiver.listens_to(), Some(("pub-1".into(), "series".into())));
    assert_eq!(receiver.contents(), vec![ChannelContent::new("b", "B", json!([3]))]);
}

#[test]
fn test_receiver_notified_on_publish() {
    let source = publisher();
    let target = listener();
    target.connect("multi", &source, "series", vec![]).unwrap();

    let receiver = target.receiver("multi").unwrap();
    let calls = Arc::new(AtomicU32::new(0));
    let c = calls.clone();
    let _sub = receiver.subscribe(ReceiverTopic::ContentsChanged, move || {
        c.fetch_add(1, Ordering::SeqCst);
    });

    source.publish("series", contents()).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(receiver.contents().len(), 2);
}

#[test]
fn test_unsupported_kind_is_rejected() {
    let source = publisher();
    let target = listener();
    let err = target
        .connect("single", &source, "grid", vec![])
        .unwrap_err();
    assert!(matches!(err, ChannelError::UnsupportedKind { .. }));
}

#[test]
fn test_single_content_receiver_rejects_multiple_selection() {
    let source = publisher();
    let target = listener();
    let err = target
        .connect("single", &source, "series", vec!["a".into(), "b".into()])
        .unwrap_err();
    assert_eq!(
        err,
        ChannelError::MultipleContentsNotSupported {
            receiver_id: "single".into(),
            requested: 2
        }
    );
}

#[test]
fn test_missing_channel_and_receiver() {
    let source = publisher();
    let target = listener();
    assert!(matches!(
        target.connect("nope", &source, "series", vec![]),
        Err(ChannelError::ReceiverNotFound { .. })
    ));
    assert!(matches!(
        target.connect("single", &source, "nope", vec![]),
        Err(ChannelError::ChannelNotFound { .. })
    ));
    assert!(matches!(
        source.publish("nope", vec![]),
        Err(ChannelError::ChannelNotFound { .. })
    ));
}

#[test]
fn test_unregistering_channels_unsubscribes_receivers() {
    let source = publisher();
    let target = listener();
    target.connect("single", &source, "series", vec![]).unwrap();
    target.connect("multi", &source, "grid", vec![]).unwrap();
    assert_eq!(target.receiver_subscriptions().len(), 2);

    let receiver = target.receiver("single").unwrap();
    let changes = Arc::new(AtomicU32::new(0));
    let c = changes.clone();
    let _sub = receiver.subscribe(ReceiverTopic::ChannelChanged, move || {
        c.fetch_add(1, Ordering::SeqCst);
    });

    source.unregister_all_channels();

    assert!(!receiver.is_subscribed());
    assert!(target.receiver_subscriptions().is_empty());
    assert_eq!(changes.load(Ordering::SeqCst), 1);
    assert!(source.channels().is_empty());
}

#[test]
fn test_unregister_all_receivers_detaches_from_channel() {
    let source = publisher();
    let target = listener();
    target.connect("single", &source, "series", vec![]).unwrap();
    let channel = source.channel("series").unwrap();
    assert_eq!(
        channel
            .publish_subscribe_delegate()
            .subscriber_count(crate::channels::ChannelTopic::ContentsChanged),
        1
    );

    target.unregister_all_receivers();

    assert!(target.receivers().is_empty());
    assert_eq!(
        channel
            .publish_subscribe_delegate()
            .subscriber_count(crate::channels::ChannelTopic::ContentsChanged),
        0
    );
}

#[test]
fn test_receiver_subscription_serializes_camel_case() {
    let source = publisher();
    let target = listener();
    target
        .connect("multi", &source, "series", vec!["a".into(), "b".into()])
        .unwrap();

    let subs = target.receiver_subscriptions();
    assert_eq!(
        subs,
        vec![ReceiverSubscription {
            id_string: "multi".into(),
            listens_to_module_instance_id: "pub-1".into(),
            channel_id_string: "series".into(),
            content_id_strings: vec!["a".into(), "b".into()],
        }]
    );
    assert_eq!(
        serde_json::to_value(&subs[0]).unwrap(),
        json!({
            "idString": "multi",
            "listensToModuleInstanceId": "pub-1",
            "channelIdString": "series",
            "contentIdStrings": ["a", "b"]
        })
    );
}

#[test]
fn test_duplicate_registration_is_skipped() {
    let manager = publisher();
    manager.register_channels([ChannelDefinition::new("series", "Again", "timeseries")]);
    assert_eq!(manager.channels().len(), 2);
}
