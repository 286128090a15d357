use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::event::{PublishSubscribe, PublishSubscribeDelegate, Topic};
use crate::utils::lock;

/// Static description of a channel a module publishes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelDefinition {
    pub id_string: String,
    pub display_name: String,
    /// Data kind, matched against [`crate::channels::ReceiverDefinition::supported_kinds`]
    pub kind: String,
}

impl ChannelDefinition {
    pub fn new(
        id_string: impl Into<String>,
        display_name: impl Into<String>,
        kind: impl Into<String>,
    ) -> Self {
        Self {
            id_string: id_string.into(),
            display_name: display_name.into(),
            kind: kind.into(),
        }
    }
}

/// One named series of data published on a channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelContent {
    pub id_string: String,
    pub display_name: String,
    pub data: Value,
}

impl ChannelContent {
    pub fn new(id_string: impl Into<String>, display_name: impl Into<String>, data: Value) -> Self {
        Self {
            id_string: id_string.into(),
            display_name: display_name.into(),
            data,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelTopic {
    ContentsChanged,
    Removed,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChannelSnapshot {
    Contents(Vec<ChannelContent>),
    Removed(bool),
}

impl Topic for ChannelTopic {
    type Snapshot = ChannelSnapshot;
}

/// A live channel owned by one module instance.
pub struct Channel {
    definition: ChannelDefinition,
    owner_instance_id: String,
    contents: Mutex<Vec<ChannelContent>>,
    removed: AtomicBool,
    delegate: PublishSubscribeDelegate<ChannelTopic>,
}

impl Channel {
    pub fn new(definition: ChannelDefinition, owner_instance_id: impl Into<String>) -> Self {
        Self {
            definition,
            owner_instance_id: owner_instance_id.into(),
            contents: Mutex::new(Vec::new()),
            removed: AtomicBool::new(false),
            delegate: PublishSubscribeDelegate::new(),
        }
    }

    pub fn definition(&self) -> &ChannelDefinition {
        &self.definition
    }

    pub fn id_string(&self) -> &str {
        &self.definition.id_string
    }

    pub fn kind(&self) -> &str {
        &self.definition.kind
    }

    pub fn owner_instance_id(&self) -> &str {
        &self.owner_instance_id
    }

    /// Replace the published contents.
    pub fn publish(&self, contents: Vec<ChannelContent>) {
        *lock(&self.contents) = contents;
        self.delegate.notify_subscribers(ChannelTopic::ContentsChanged);
    }

    pub fn contents(&self) -> Vec<ChannelContent> {
        lock(&self.contents).clone()
    }

    pub fn content_ids(&self) -> Vec<String> {
        lock(&self.contents)
            .iter()
            .map(|content| content.id_string.clone())
            .collect()
    }

    pub fn is_removed(&self) -> bool {
        self.removed.load(Ordering::SeqCst)
    }

    /// Flag as removed and tell every listener. Only the first call notifies.
    pub(crate) fn mark_removed(&self) {
        if !self.removed.swap(true, Ordering::SeqCst) {
            self.delegate.notify_subscribers(ChannelTopic::Removed);
        }
    }
}

impl PublishSubscribe<ChannelTopic> for Channel {
    fn publish_subscribe_delegate(&self) -> &PublishSubscribeDelegate<ChannelTopic> {
        &self.delegate
    }

    fn snapshot(&self, topic: ChannelTopic) -> ChannelSnapshot {
        match topic {
            ChannelTopic::ContentsChanged => ChannelSnapshot::Contents(self.contents()),
            ChannelTopic::Removed => ChannelSnapshot::Removed(self.is_removed()),
        }
    }
}

impl fmt::Debug for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Channel")
            .field("id", &self.definition.id_string)
            .field("owner", &self.owner_instance_id)
            .field("removed", &self.is_removed())
            .finish()
    }
}
