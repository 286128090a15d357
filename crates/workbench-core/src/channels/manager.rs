use std::fmt;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::channels::channel::{Channel, ChannelContent, ChannelDefinition};
use crate::channels::error::ChannelError;
use crate::channels::receiver::{ChannelReceiver, ReceiverDefinition};
use crate::event::{PublishSubscribe, PublishSubscribeDelegate, Topic};
use crate::utils::lock;

/// Serializable record of one receiver's subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiverSubscription {
    pub id_string: String,
    pub listens_to_module_instance_id: String,
    pub channel_id_string: String,
    pub content_id_strings: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelManagerTopic {
    Channels,
    Receivers,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChannelManagerSnapshot {
    ChannelIds(Vec<String>),
    ReceiverIds(Vec<String>),
}

impl Topic for ChannelManagerTopic {
    type Snapshot = ChannelManagerSnapshot;
}

/// Channels and receivers of one module instance.
pub struct ChannelManager {
    instance_id: String,
    channels: Mutex<Vec<Arc<Channel>>>,
    receivers: Mutex<Vec<Arc<ChannelReceiver>>>,
    delegate: PublishSubscribeDelegate<ChannelManagerTopic>,
}

impl ChannelManager {
    pub fn new(instance_id: impl Into<String>) -> Self {
        Self {
            instance_id: instance_id.into(),
            channels: Mutex::new(Vec::new()),
            receivers: Mutex::new(Vec::new()),
            delegate: PublishSubscribeDelegate::new(),
        }
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    /// Register channels. Ids already present are skipped.
    pub fn register_channels(&self, definitions: impl IntoIterator<Item = ChannelDefinition>) {
        {
            let mut channels = lock(&self.channels);
            for definition in definitions {
                if channels.iter().any(|c| c.id_string() == definition.id_string) {
                    log::warn!(
                        "Channel '{}' already registered on '{}'",
                        definition.id_string,
                        self.instance_id
                    );
                    continue;
                }
                channels.push(Arc::new(Channel::new(definition, self.instance_id.clone())));
            }
        }
        self.delegate.notify_subscribers(ChannelManagerTopic::Channels);
    }

    /// Register receivers. Ids already present are skipped.
    pub fn register_receivers(&self, definitions: impl IntoIterator<Item = ReceiverDefinition>) {
        {
            let mut receivers = lock(&self.receivers);
            for definition in definitions {
                if receivers.iter().any(|r| r.id_string() == definition.id_string) {
                    log::warn!(
                        "Receiver '{}' already registered on '{}'",
                        definition.id_string,
                        self.instance_id
                    );
                    continue;
                }
                receivers.push(Arc::new(ChannelReceiver::new(
                    definition,
                    self.instance_id.clone(),
                )));
            }
        }
        self.delegate.notify_subscribers(ChannelManagerTopic::Receivers);
    }

    pub fn channel(&self, id: &str) -> Option<Arc<Channel>> {
        lock(&self.channels)
            .iter()
            .find(|c| c.id_string() == id)
            .cloned()
    }

    pub fn receiver(&self, id: &str) -> Option<Arc<ChannelReceiver>> {
        lock(&self.receivers)
            .iter()
            .find(|r| r.id_string() == id)
            .cloned()
    }

    pub fn channels(&self) -> Vec<Arc<Channel>> {
        lock(&self.channels).clone()
    }

    pub fn receivers(&self) -> Vec<Arc<ChannelReceiver>> {
        lock(&self.receivers).clone()
    }

    pub fn publish(&self, channel_id: &str, contents: Vec<ChannelContent>) -> Result<(), ChannelError> {
        let channel = self
            .channel(channel_id)
            .ok_or_else(|| ChannelError::ChannelNotFound {
                instance_id: self.instance_id.clone(),
                channel_id: channel_id.to_string(),
            })?;
        channel.publish(contents);
        Ok(())
    }

    /// Point one of our receivers at a channel of `source`.
    pub fn connect(
        &self,
        receiver_id: &str,
        source: &ChannelManager,
        channel_id: &str,
        content_ids: Vec<String>,
    ) -> Result<(), ChannelError> {
        let receiver = self
            .receiver(receiver_id)
            .ok_or_else(|| ChannelError::ReceiverNotFound {
                instance_id: self.instance_id.clone(),
                receiver_id: receiver_id.to_string(),
            })?;
        let channel = source
            .channel(channel_id)
            .ok_or_else(|| ChannelError::ChannelNotFound {
                instance_id: source.instance_id.clone(),
                channel_id: channel_id.to_string(),
            })?;
        receiver.listen_to(channel, content_ids)
    }

    /// Remove every published channel. Receivers elsewhere unsubscribe themselves.
    pub fn unregister_all_channels(&self) {
        let removed: Vec<Arc<Channel>> = lock(&self.channels).drain(..).collect();
        if removed.is_empty() {
            return;
        }
        for channel in &removed {
            channel.mark_removed();
        }
        self.delegate.notify_subscribers(ChannelManagerTopic::Channels);
    }

    /// Drop every receiver together with its subscription.
    pub fn unregister_all_receivers(&self) {
        let removed: Vec<Arc<ChannelReceiver>> = lock(&self.receivers).drain(..).collect();
        if removed.is_empty() {
            return;
        }
        for receiver in &removed {
            receiver.unsubscribe();
        }
        self.delegate.notify_subscribers(ChannelManagerTopic::Receivers);
    }

    pub fn receiver_subscriptions(&self) -> Vec<ReceiverSubscription> {
        self.receivers()
            .iter()
            .filter_map(|receiver| {
                receiver
                    .listens_to()
                    .map(|(instance_id, channel_id)| ReceiverSubscription {
                        id_string: receiver.id_string().to_string(),
                        listens_to_module_instance_id: instance_id,
                        channel_id_string: channel_id,
                        content_id_strings: receiver.content_ids(),
                    })
            })
            .collect()
    }
}

impl PublishSubscribe<ChannelManagerTopic> for ChannelManager {
    fn publish_subscribe_delegate(&self) -> &PublishSubscribeDelegate<ChannelManagerTopic> {
        &self.delegate
    }

    fn snapshot(&self, topic: ChannelManagerTopic) -> ChannelManagerSnapshot {
        match topic {
            ChannelManagerTopic::Channels => ChannelManagerSnapshot::ChannelIds(
                self.channels()
                    .iter()
                    .map(|c| c.id_string().to_string())
                    .collect(),
            ),
            ChannelManagerTopic::Receivers => ChannelManagerSnapshot::ReceiverIds(
                self.receivers()
                    .iter()
                    .map(|r| r.id_string().to_string())
                    .collect(),
            ),
        }
    }
}

impl fmt::Debug for ChannelManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelManager")
            .field("instance_id", &self.instance_id)
            .field("channels", &lock(&self.channels).len())
            .field("receivers", &lock(&self.receivers).len())
            .finish()
    }
}
