use std::fmt;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::channels::channel::{Channel, ChannelContent, ChannelTopic};
use crate::channels::error::ChannelError;
use crate::event::{PublishSubscribe, PublishSubscribeDelegate, Topic, Unsubscribe};
use crate::utils::lock;

/// Static description of a receiver slot a module exposes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiverDefinition {
    pub id_string: String,
    pub display_name: String,
    pub supported_kinds: Vec<String>,
    pub supports_multi_contents: bool,
}

impl ReceiverDefinition {
    pub fn new(
        id_string: impl Into<String>,
        display_name: impl Into<String>,
        supported_kinds: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            id_string: id_string.into(),
            display_name: display_name.into(),
            supported_kinds: supported_kinds.into_iter().map(Into::into).collect(),
            supports_multi_contents: false,
        }
    }

    pub fn multi_contents(mut self) -> Self {
        self.supports_multi_contents = true;
        self
    }

    pub fn accepts(&self, kind: &str) -> bool {
        self.supported_kinds.iter().any(|k| k == kind)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReceiverTopic {
    /// Subscribed, unsubscribed or switched channel
    ChannelChanged,
    /// The selected contents of the listened-to channel changed
    ContentsChanged,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReceiverSnapshot {
    Channel(Option<(String, String)>),
    Contents(Vec<ChannelContent>),
}

impl Topic for ReceiverTopic {
    type Snapshot = ReceiverSnapshot;
}

struct ActiveSubscription {
    channel: Arc<Channel>,
    content_ids: Vec<String>,
    handles: Unsubscribe,
}

/// Receiving end of a data channel, owned by one module instance.
pub struct ChannelReceiver {
    definition: ReceiverDefinition,
    owner_instance_id: String,
    subscription: Mutex<Option<ActiveSubscription>>,
    delegate: PublishSubscribeDelegate<ReceiverTopic>,
}

impl ChannelReceiver {
    pub fn new(definition: ReceiverDefinition, owner_instance_id: impl Into<String>) -> Self {
        Self {
            definition,
            owner_instance_id: owner_instance_id.into(),
            subscription: Mutex::new(None),
            delegate: PublishSubscribeDelegate::new(),
        }
    }

    pub fn definition(&self) -> &ReceiverDefinition {
        &self.definition
    }

    pub fn id_string(&self) -> &str {
        &self.definition.id_string
    }

    pub fn owner_instance_id(&self) -> &str {
        &self.owner_instance_id
    }

    /// Listen to `channel`, selecting `content_ids` (empty selects everything).
    pub fn listen_to(
        self: &Arc<Self>,
        channel: Arc<Channel>,
        content_ids: Vec<String>,
    ) -> Result<(), ChannelError> {
        if !self.definition.accepts(channel.kind()) {
            return Err(ChannelError::UnsupportedKind {
                receiver_id: self.definition.id_string.clone(),
                kind: channel.kind().to_string(),
            });
        }
        if !self.definition.supports_multi_contents && content_ids.len() > 1 {
            return Err(ChannelError::MultipleContentsNotSupported {
                receiver_id: self.definition.id_string.clone(),
                requested: content_ids.len(),
            });
        }
        if channel.is_removed() {
            return Err(ChannelError::ChannelRemoved {
                channel_id: channel.id_string().to_string(),
            });
        }

        self.release();

        let receiver = Arc::downgrade(self);
        let on_contents = channel.subscribe(ChannelTopic::ContentsChanged, move || {
            if let Some(receiver) = receiver.upgrade() {
                receiver.delegate.notify_subscribers(ReceiverTopic::ContentsChanged);
            }
        });
        let receiver = Arc::downgrade(self);
        let on_removed = channel.subscribe(ChannelTopic::Removed, move || {
            if let Some(receiver) = receiver.upgrade() {
                log::debug!(
                    "Receiver '{}' of '{}' lost its channel",
                    receiver.definition.id_string,
                    receiver.owner_instance_id
                );
                receiver.unsubscribe();
            }
        });

        *lock(&self.subscription) = Some(ActiveSubscription {
            channel,
            content_ids,
            handles: Unsubscribe::all(vec![on_contents, on_removed]),
        });
        self.delegate.notify_subscribers(ReceiverTopic::ChannelChanged);
        self.delegate.notify_subscribers(ReceiverTopic::ContentsChanged);
        Ok(())
    }

    /// Stop listening. A no-op when not subscribed.
    pub fn unsubscribe(&self) {
        if self.release() {
            self.delegate.notify_subscribers(ReceiverTopic::ChannelChanged);
            self.delegate.notify_subscribers(ReceiverTopic::ContentsChanged);
        }
    }

    fn release(&self) -> bool {
        let previous = lock(&self.subscription).take();
        match previous {
            Some(previous) => {
                previous.handles.unsubscribe();
                true
            }
            None => false,
        }
    }

    pub fn is_subscribed(&self) -> bool {
        lock(&self.subscription).is_some()
    }

    /// `(instance id, channel id)` of the channel listened to.
    pub fn listens_to(&self) -> Option<(String, String)> {
        lock(&self.subscription).as_ref().map(|s| {
            (
                s.channel.owner_instance_id().to_string(),
                s.channel.id_string().to_string(),
            )
        })
    }

    pub fn content_ids(&self) -> Vec<String> {
        lock(&self.subscription)
            .as_ref()
            .map(|s| s.content_ids.clone())
            .unwrap_or_default()
    }

    /// Selected contents of the listened-to channel.
    pub fn contents(&self) -> Vec<ChannelContent> {
        let Some((channel, selected)) = lock(&self.subscription)
            .as_ref()
            .map(|s| (s.channel.clone(), s.content_ids.clone()))
        else {
            return Vec::new();
        };
        let contents = channel.contents();
        if selected.is_empty() {
            return contents;
        }
        contents
            .into_iter()
            .filter(|content| selected.contains(&content.id_string))
            .collect()
    }
}

impl PublishSubscribe<ReceiverTopic> for ChannelReceiver {
    fn publish_subscribe_delegate(&self) -> &PublishSubscribeDelegate<ReceiverTopic> {
        &self.delegate
    }

    fn snapshot(&self, topic: ReceiverTopic) -> ReceiverSnapshot {
        match topic {
            ReceiverTopic::ChannelChanged => ReceiverSnapshot::Channel(self.listens_to()),
            ReceiverTopic::ContentsChanged => ReceiverSnapshot::Contents(self.contents()),
        }
    }
}

impl fmt::Debug for ChannelReceiver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelReceiver")
            .field("id", &self.definition.id_string)
            .field("owner", &self.owner_instance_id)
            .field("listens_to", &self.listens_to())
            .finish()
    }
}
