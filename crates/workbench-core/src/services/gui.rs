use std::fmt;
use std::sync::Arc;

use serde_json::{json, Value};

use crate::event::{
    DispatchedEvent, EventDispatcher, EventResult, EventSystemError, HandlerId, Unsubscribe,
};
use crate::kernel::error::Result;
use crate::state::{StateKeyOptions, StateKeySpec, StateStore};
use crate::storage::{read_or_default, write_json, KeyValueStore, PersistedKey};

/// Keys of the GUI state store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GuiState {
    LeftDrawerContent,
    RightDrawerContent,
    SettingsPanelWidthInPercent,
    DataChannelConnectionLayerVisible,
    EditDataChannelConnections,
}

impl GuiState {
    pub const ALL: [GuiState; 5] = [
        GuiState::LeftDrawerContent,
        GuiState::RightDrawerContent,
        GuiState::SettingsPanelWidthInPercent,
        GuiState::DataChannelConnectionLayerVisible,
        GuiState::EditDataChannelConnections,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GuiState::LeftDrawerContent => "leftDrawerContent",
            GuiState::RightDrawerContent => "rightDrawerContent",
            GuiState::SettingsPanelWidthInPercent => "settingsPanelWidthInPercent",
            GuiState::DataChannelConnectionLayerVisible => "dataChannelConnectionLayerVisible",
            GuiState::EditDataChannelConnections => "editDataChannelConnections",
        }
    }

    pub fn default_value(&self) -> Value {
        match self {
            GuiState::LeftDrawerContent => json!("ModuleSettings"),
            GuiState::RightDrawerContent => json!("ModulesList"),
            GuiState::SettingsPanelWidthInPercent => json!(20),
            GuiState::DataChannelConnectionLayerVisible => json!(false),
            GuiState::EditDataChannelConnections => json!(false),
        }
    }

    /// Drawer contents and panel width survive restarts.
    pub fn is_persisted(&self) -> bool {
        matches!(
            self,
            GuiState::LeftDrawerContent
                | GuiState::RightDrawerContent
                | GuiState::SettingsPanelWidthInPercent
        )
    }

    pub fn persisted_key(&self) -> PersistedKey {
        PersistedKey::GuiState(self.as_str().to_string())
    }
}

impl fmt::Display for GuiState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One-shot GUI events.
#[derive(Debug, Clone, PartialEq)]
pub enum GuiEvent {
    ModuleHeaderPointerDown { module_instance_id: String },
    NewModulePointerDown { module_name: String },
    RemoveModuleInstanceRequest { module_instance_id: String },
    DataChannelConnectionsChange,
    HighlightDataChannelConnection {
        module_instance_id: String,
        receiver_id_string: String,
    },
    UnhighlightDataChannelConnection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GuiEventKind {
    ModuleHeaderPointerDown,
    NewModulePointerDown,
    RemoveModuleInstanceRequest,
    DataChannelConnectionsChange,
    HighlightDataChannelConnection,
    UnhighlightDataChannelConnection,
}

impl DispatchedEvent for GuiEvent {
    type Kind = GuiEventKind;

    fn kind(&self) -> GuiEventKind {
        match self {
            GuiEvent::ModuleHeaderPointerDown { .. } => GuiEventKind::ModuleHeaderPointerDown,
            GuiEvent::NewModulePointerDown { .. } => GuiEventKind::NewModulePointerDown,
            GuiEvent::RemoveModuleInstanceRequest { .. } => {
                GuiEventKind::RemoveModuleInstanceRequest
            }
            GuiEvent::DataChannelConnectionsChange => GuiEventKind::DataChannelConnectionsChange,
            GuiEvent::HighlightDataChannelConnection { .. } => {
                GuiEventKind::HighlightDataChannelConnection
            }
            GuiEvent::UnhighlightDataChannelConnection => {
                GuiEventKind::UnhighlightDataChannelConnection
            }
        }
    }
}

/// GUI state and event hub.
///
/// Persisted keys are read from the key-value store at construction and
/// written back whenever they change.
pub struct GuiMessageBroker {
    state: StateStore<GuiState, Value>,
    dispatcher: EventDispatcher<GuiEvent>,
    storage: Option<Arc<dyn KeyValueStore>>,
}

impl GuiMessageBroker {
    /// A broker that keeps everything in memory.
    pub fn new() -> Self {
        Self::build(None)
    }

    /// A broker mirroring its persisted keys into `storage`.
    pub fn with_storage(storage: Arc<dyn KeyValueStore>) -> Self {
        Self::build(Some(storage))
    }

    fn build(storage: Option<Arc<dyn KeyValueStore>>) -> Self {
        let schema = GuiState::ALL.into_iter().map(|key| {
            let default = match &storage {
                Some(storage) if key.is_persisted() => {
                    read_or_default(storage.as_ref(), &key.persisted_key(), key.default_value())
                }
                _ => key.default_value(),
            };
            let options = if key.is_persisted() {
                StateKeyOptions::persisted()
            } else {
                StateKeyOptions::deep_compare()
            };
            StateKeySpec::new(key, default).with_options(options)
        });
        Self {
            state: StateStore::new(schema),
            dispatcher: EventDispatcher::new(),
            storage,
        }
    }

    pub fn get_state(&self, key: GuiState) -> Result<Value> {
        Ok(self.state.get_value(&key)?)
    }

    /// Update a GUI state value. Persisted keys are written through.
    pub fn set_state(&self, key: GuiState, value: Value) -> Result<bool> {
        let changed = self.state.set_value(&key, value)?;
        if changed && self.state.options(&key)?.persist {
            self.persist_key(key)?;
        }
        Ok(changed)
    }

    pub fn subscribe_to_state<F>(&self, key: GuiState, callback: F) -> Result<Unsubscribe>
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        Ok(self.state.subscribe(&key, callback)?)
    }

    /// Write every persisted key to storage.
    pub fn persist_all(&self) -> Result<()> {
        for key in self.state.persisted_keys() {
            self.persist_key(key)?;
        }
        Ok(())
    }

    fn persist_key(&self, key: GuiState) -> Result<()> {
        let Some(storage) = &self.storage else {
            return Ok(());
        };
        let value = self.state.get_shared_value(&key)?;
        write_json(storage.as_ref(), &key.persisted_key(), value.as_ref())
    }

    pub fn register_handler<F>(&self, kind: GuiEventKind, handler: F) -> HandlerId
    where
        F: Fn(&GuiEvent) -> EventResult + Send + Sync + 'static,
    {
        self.dispatcher.register_handler(kind, handler)
    }

    pub fn unregister_handler(&self, id: HandlerId) -> Result<()> {
        if self.dispatcher.unregister_handler(id) {
            Ok(())
        } else {
            Err(EventSystemError::HandlerNotFound { id }.into())
        }
    }

    /// Deliver `event` to its handlers right away.
    pub fn publish_event(&self, event: &GuiEvent) -> EventResult {
        log::trace!("GUI event {:?}", event.kind());
        self.dispatcher.dispatch(event)
    }

    /// Queue `event` for the next [`GuiMessageBroker::process_events`].
    pub fn queue_event(&self, event: GuiEvent) {
        self.dispatcher.queue_event(event);
    }

    pub fn process_events(&self) -> usize {
        self.dispatcher.process_queue()
    }
}

impl Default for GuiMessageBroker {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for GuiMessageBroker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GuiMessageBroker")
            .field("state", &self.state)
            .field("dispatcher", &self.dispatcher)
            .field("storage", &self.storage.as_ref().map(|s| s.name().to_string()))
            .finish()
    }
}
