use std::fmt;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::event::{PublishSubscribe, PublishSubscribeDelegate, Topic};
use crate::utils::lock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusSource {
    View,
    Settings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MessageSeverity {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusMessage {
    pub source: StatusSource,
    pub severity: MessageSeverity,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusTopic {
    Loading,
    Messages,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StatusSnapshot {
    Loading(bool),
    Messages(Vec<StatusMessage>),
}

impl Topic for StatusTopic {
    type Snapshot = StatusSnapshot;
}

#[derive(Default)]
struct StatusState {
    loading: bool,
    messages: Vec<StatusMessage>,
}

/// Loading flag and message log reported by an instance's view and settings.
#[derive(Default)]
pub struct StatusController {
    state: Mutex<StatusState>,
    delegate: PublishSubscribeDelegate<StatusTopic>,
}

impl StatusController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_loading(&self) -> bool {
        lock(&self.state).loading
    }

    pub fn set_loading(&self, loading: bool) {
        let changed = {
            let mut state = lock(&self.state);
            let changed = state.loading != loading;
            state.loading = loading;
            changed
        };
        if changed {
            self.delegate.notify_subscribers(StatusTopic::Loading);
        }
    }

    pub fn add_message(&self, source: StatusSource, severity: MessageSeverity, text: impl Into<String>) {
        lock(&self.state).messages.push(StatusMessage {
            source,
            severity,
            text: text.into(),
        });
        self.delegate.notify_subscribers(StatusTopic::Messages);
    }

    pub fn messages(&self) -> Vec<StatusMessage> {
        lock(&self.state).messages.clone()
    }

    /// Highest severity currently logged.
    pub fn worst_severity(&self) -> Option<MessageSeverity> {
        lock(&self.state).messages.iter().map(|m| m.severity).max()
    }

    /// Drop messages from `source`, or all of them when `None`.
    pub fn clear_messages(&self, source: Option<StatusSource>) {
        let changed = {
            let mut state = lock(&self.state);
            let before = state.messages.len();
            state
                .messages
                .retain(|m| source.is_some_and(|source| m.source != source));
            state.messages.len() != before
        };
        if changed {
            self.delegate.notify_subscribers(StatusTopic::Messages);
        }
    }
}

impl PublishSubscribe<StatusTopic> for StatusController {
    fn publish_subscribe_delegate(&self) -> &PublishSubscribeDelegate<StatusTopic> {
        &self.delegate
    }

    fn snapshot(&self, topic: StatusTopic) -> StatusSnapshot {
        match topic {
            StatusTopic::Loading => StatusSnapshot::Loading(self.is_loading()),
            StatusTopic::Messages => StatusSnapshot::Messages(self.messages()),
        }
    }
}

impl fmt::Debug for StatusController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = lock(&self.state);
        f.debug_struct("StatusController")
            .field("loading", &state.loading)
            .field("messages", &state.messages.len())
            .finish()
    }
}
