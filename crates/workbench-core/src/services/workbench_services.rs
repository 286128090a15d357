use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use serde_json::Value;

use crate::event::{PublishSubscribe, PublishSubscribeDelegate, Topic, Unsubscribe};
use crate::module_system::{ModuleInstance, SyncSettingKey};
use crate::utils::lock;

/// Global topics shared across module instances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GlobalTopic {
    Synced(SyncSettingKey),
    HoverTimestamp,
}

/// Latest value of a global topic and the instance that published it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GlobalData {
    pub value: Option<Value>,
    pub publisher: Option<String>,
}

impl Topic for GlobalTopic {
    type Snapshot = GlobalData;
}

pub struct WorkbenchServices {
    data: Mutex<HashMap<GlobalTopic, GlobalData>>,
    delegate: PublishSubscribeDelegate<GlobalTopic>,
}

impl WorkbenchServices {
    pub fn new() -> Self {
        Self {
            data: Mutex::new(HashMap::new()),
            delegate: PublishSubscribeDelegate::new(),
        }
    }

    /// Store `value` under `topic`. Subscribers are notified when the value
    /// or its publisher changed.
    pub fn publish_global_data(&self, topic: GlobalTopic, value: Value, publisher: Option<&str>) {
        let next = GlobalData {
            value: Some(value),
            publisher: publisher.map(str::to_string),
        };
        {
            let mut data = lock(&self.data);
            if data.get(&topic) == Some(&next) {
                return;
            }
            data.insert(topic, next);
        }
        log::trace!("Published global data for {:?}", topic);
        self.delegate.notify_subscribers(topic);
    }

    pub fn get_global_data(&self, topic: GlobalTopic) -> Option<Value> {
        lock(&self.data).get(&topic).and_then(|data| data.value.clone())
    }

    /// Publish a synced setting on behalf of `instance`.
    ///
    /// Nothing happens unless `key` is active for the instance. Returns whether
    /// the value went out.
    pub fn publish_synced(&self, instance: &ModuleInstance, key: SyncSettingKey, value: Value) -> bool {
        if !instance.is_synced(key) {
            return false;
        }
        self.publish_global_data(GlobalTopic::Synced(key), value, Some(instance.id()));
        true
    }

    /// Follow a synced setting for `instance`.
    ///
    /// `callback` receives values published by other instances while `key` is
    /// active for this one. Notifications caused by the instance itself are
    /// ignored.
    pub fn subscribe_synced<F>(
        self: &Arc<Self>,
        instance: &Arc<ModuleInstance>,
        key: SyncSettingKey,
        callback: F,
    ) -> Unsubscribe
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        let services = Arc::downgrade(self);
        let instance = Arc::downgrade(instance);
        let topic = GlobalTopic::Synced(key);
        self.subscribe(topic, move || {
            let (Some(services), Some(instance)) = (services.upgrade(), instance.upgrade()) else {
                return;
            };
            if !instance.is_synced(key) {
                return;
            }
            let data = services.snapshot(topic);
            if data.publisher.as_deref() == Some(instance.id()) {
                return;
            }
            if let Some(value) = &data.value {
                callback(value);
            }
        })
    }
}

impl Default for WorkbenchServices {
    fn default() -> Self {
        Self::new()
    }
}

impl PublishSubscribe<GlobalTopic> for WorkbenchServices {
    fn publish_subscribe_delegate(&self) -> &PublishSubscribeDelegate<GlobalTopic> {
        &self.delegate
    }

    fn snapshot(&self, topic: GlobalTopic) -> GlobalData {
        lock(&self.data).get(&topic).cloned().unwrap_or_default()
    }
}

impl fmt::Debug for WorkbenchServices {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkbenchServices")
            .field("topics", &lock(&self.data).len())
            .finish()
    }
}
