use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use crate::event::PublishSubscribe;
use crate::module_system::{MessageSeverity, StatusController, StatusSource, StatusTopic};

#[test]
fn test_loading_notifies_only_on_change() {
    let status = StatusController::new();
    let calls = Arc::new(AtomicU32::new(0));
    let c = calls.clone();
    let _sub = status.subscribe(StatusTopic::Loading, move || {
        c.fetch_add(1, Ordering::SeqCst);
    });

    status.set_loading(true);
    status.set_loading(true);
    status.set_loading(false);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert!(!status.is_loading());
}

#[test]
fn test_messages_and_clearing_by_source() {
    let status = StatusController::new();
    status.add_message(StatusSource::View, MessageSeverity::Warning, "slow data");
    status.add_message(StatusSource::Settings, MessageSeverity::Error, "bad input");
    status.add_message(StatusSource::View, MessageSeverity::Info, "done");
    assert_eq!(status.worst_severity(), Some(MessageSeverity::Error));

    status.clear_messages(Some(StatusSource::Settings));
    let messages = status.messages();
    assert_eq!(messages.len(), 2);
    assert!(messages.iter().all(|m| m.source == StatusSource::View));
    assert_eq!(status.worst_severity(), Some(MessageSeverity::Warning));

    status.clear_messages(None);
    assert!(status.messages().is_empty());
    assert_eq!(status.worst_severity(), None);
}
