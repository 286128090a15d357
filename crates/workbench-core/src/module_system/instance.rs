use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, OnceLock};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::channels::{ChannelManager, ReceiverSubscription};
use crate::event::{PublishSubscribe, PublishSubscribeDelegate, Topic};
use crate::kernel::error::Result;
use crate::module_system::definition::{ModuleSerialization, ModuleStateStore};
use crate::module_system::error::ModuleSystemError;
use crate::module_system::interface::UniDirectionalInterface;
use crate::module_system::module::{ImportState, Module};
use crate::module_system::status::StatusController;
use crate::module_system::sync::SyncSettingKey;
use crate::utils::lock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModuleInstanceTopic {
    Title,
    ImportState,
    SyncedSettings,
    Initialized,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ModuleInstanceSnapshot {
    Title(String),
    ImportState(ImportState),
    SyncedSettings(Vec<SyncSettingKey>),
    Initialized(bool),
}

impl Topic for ModuleInstanceTopic {
    type Snapshot = ModuleInstanceSnapshot;
}

/// Persisted form of a module instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleInstanceFullState {
    pub id: String,
    pub name: String,
    pub title: String,
    #[serde(default)]
    pub synced_settings: Vec<SyncSettingKey>,
    #[serde(default)]
    pub data_channel_receiver_subscriptions: Vec<ReceiverSubscription>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serialized_state: Option<Value>,
}

/// What a dashboard slot should show for an instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstanceTile {
    /// Import still running or instance not yet initialized
    Pending,
    Ready,
    /// Module missing or failed to import. The user may remove the tile.
    Fallback { reason: String, removable: bool },
}

/// A live instance of a [`Module`] placed on a dashboard.
pub struct ModuleInstance {
    id: String,
    module: Arc<Module>,
    title: Mutex<String>,
    state_store: Arc<ModuleStateStore>,
    channel_manager: Arc<ChannelManager>,
    status_controller: Arc<StatusController>,
    synced_settings: Mutex<Vec<SyncSettingKey>>,
    initialized: AtomicBool,
    unloaded: AtomicBool,
    settings_to_view: OnceLock<UniDirectionalInterface>,
    view_to_settings: OnceLock<UniDirectionalInterface>,
    serialization: OnceLock<ModuleSerialization>,
    pending_serialized_state: Mutex<Option<Value>>,
    delegate: PublishSubscribeDelegate<ModuleInstanceTopic>,
}

impl ModuleInstance {
    pub(crate) fn new(id: String, module: Arc<Module>, state_store: Arc<ModuleStateStore>) -> Self {
        let definition = module.definition();
        let channel_manager = Arc::new(ChannelManager::new(id.clone()));
        channel_manager.register_channels(definition.channels().iter().cloned());
        channel_manager.register_receivers(definition.receivers().iter().cloned());
        log::debug!("Created instance '{}' of module '{}'", id, module.name());

        Self {
            title: Mutex::new(definition.default_title().to_string()),
            id,
            module,
            state_store,
            channel_manager,
            status_controller: Arc::new(StatusController::new()),
            synced_settings: Mutex::new(Vec::new()),
            initialized: AtomicBool::new(false),
            unloaded: AtomicBool::new(false),
            settings_to_view: OnceLock::new(),
            view_to_settings: OnceLock::new(),
            serialization: OnceLock::new(),
            pending_serialized_state: Mutex::new(None),
            delegate: PublishSubscribeDelegate::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn module(&self) -> &Arc<Module> {
        &self.module
    }

    pub fn module_name(&self) -> &str {
        self.module.name()
    }

    pub fn state_store(&self) -> &Arc<ModuleStateStore> {
        &self.state_store
    }

    pub fn channel_manager(&self) -> &Arc<ChannelManager> {
        &self.channel_manager
    }

    pub fn status_controller(&self) -> &Arc<StatusController> {
        &self.status_controller
    }

    pub fn import_state(&self) -> ImportState {
        self.module.import_state()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    pub fn is_unloaded(&self) -> bool {
        self.unloaded.load(Ordering::SeqCst)
    }

    /// Wire interfaces and serialization. Runs at most once.
    pub fn initialize(&self) {
        if self.is_unloaded() {
            return;
        }
        if self
            .initialized
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return;
        }

        let definition = self.module.definition();
        let interfaces = [
            (definition.settings_to_view(), &self.settings_to_view, "settingsToView"),
            (definition.view_to_settings(), &self.view_to_settings, "viewToSettings"),
        ];
        for (initialization, slot, label) in interfaces {
            let Some(initialization) = initialization else { continue };
            match UniDirectionalInterface::new(initialization, &self.state_store) {
                Ok(interface) => {
                    let _ = slot.set(interface);
                }
                Err(e) => log::error!(
                    "Failed to build {} interface for instance '{}': {}",
                    label,
                    self.id,
                    e
                ),
            }
        }

        let pending = {
            let mut pending = lock(&self.pending_serialized_state);
            if let Some(serialization) = definition.serialization() {
                let _ = self.serialization.set(serialization.clone());
            }
            pending.take()
        };
        if let Some(state) = pending {
            if let Err(e) = self.apply_serialized_state(&state) {
                log::warn!("Dropping persisted state of instance '{}': {}", self.id, e);
            }
        }

        log::debug!("Initialized instance '{}'", self.id);
        self.delegate.notify_subscribers(ModuleInstanceTopic::Initialized);
    }

    pub fn settings_to_view(&self) -> Result<&UniDirectionalInterface> {
        self.interface(&self.settings_to_view, "settingsToView")
    }

    pub fn view_to_settings(&self) -> Result<&UniDirectionalInterface> {
        self.interface(&self.view_to_settings, "viewToSettings")
    }

    fn interface<'a>(
        &self,
        slot: &'a OnceLock<UniDirectionalInterface>,
        label: &str,
    ) -> Result<&'a UniDirectionalInterface> {
        if !self.is_initialized() {
            return Err(ModuleSystemError::NotInitialized {
                instance_id: self.id.clone(),
            }
            .into());
        }
        slot.get().ok_or_else(|| {
            ModuleSystemError::InterfaceNotDeclared {
                module: self.module_name().to_string(),
                interface: label.to_string(),
            }
            .into()
        })
    }

    pub fn title(&self) -> String {
        lock(&self.title).clone()
    }

    pub fn set_title(&self, title: impl Into<String>) {
        let title = title.into();
        let changed = {
            let mut current = lock(&self.title);
            let changed = *current != title;
            *current = title;
            changed
        };
        if changed {
            self.delegate.notify_subscribers(ModuleInstanceTopic::Title);
        }
    }

    pub fn synced_settings(&self) -> Vec<SyncSettingKey> {
        lock(&self.synced_settings).clone()
    }

    pub fn is_synced(&self, key: SyncSettingKey) -> bool {
        lock(&self.synced_settings).contains(&key)
    }

    pub fn add_synced_setting(&self, key: SyncSettingKey) -> Result<()> {
        if !self.module.definition().supports_sync(key) {
            return Err(ModuleSystemError::SyncSettingNotSupported {
                module: self.module_name().to_string(),
                key,
            }
            .into());
        }
        let added = {
            let mut keys = lock(&self.synced_settings);
            if keys.contains(&key) {
                false
            } else {
                keys.push(key);
                true
            }
        };
        if added {
            self.delegate.notify_subscribers(ModuleInstanceTopic::SyncedSettings);
        }
        Ok(())
    }

    pub fn remove_synced_setting(&self, key: SyncSettingKey) {
        let removed = {
            let mut keys = lock(&self.synced_settings);
            let before = keys.len();
            keys.retain(|k| *k != key);
            keys.len() != before
        };
        if removed {
            self.delegate.notify_subscribers(ModuleInstanceTopic::SyncedSettings);
        }
    }

    pub fn get_full_state(&self) -> ModuleInstanceFullState {
        let serialized_state = if self.is_initialized() {
            self.serialization
                .get()
                .map(|serialization| (serialization.serialize)(&self.state_store))
        } else {
            lock(&self.pending_serialized_state).clone()
        };
        ModuleInstanceFullState {
            id: self.id.clone(),
            name: self.module_name().to_string(),
            title: self.title(),
            synced_settings: self.synced_settings(),
            data_channel_receiver_subscriptions: self.channel_manager.receiver_subscriptions(),
            serialized_state,
        }
    }

    /// Restore title, synced settings and module state.
    ///
    /// Receiver subscriptions are left to the owning dashboard, which restores
    /// them once every instance exists. Module state that arrives before
    /// [`ModuleInstance::initialize`] is applied when initialization runs.
    pub fn set_full_state(&self, state: &ModuleInstanceFullState) -> Result<()> {
        self.set_title(state.title.clone());

        let supported: Vec<SyncSettingKey> = state
            .synced_settings
            .iter()
            .copied()
            .filter(|key| {
                let ok = self.module.definition().supports_sync(*key);
                if !ok {
                    log::warn!(
                        "Ignoring unsupported synced setting '{}' for instance '{}'",
                        key,
                        self.id
                    );
                }
                ok
            })
            .collect();
        let changed = {
            let mut keys = lock(&self.synced_settings);
            let changed = *keys != supported;
            *keys = supported;
            changed
        };
        if changed {
            self.delegate.notify_subscribers(ModuleInstanceTopic::SyncedSettings);
        }

        let Some(serialized) = &state.serialized_state else {
            return Ok(());
        };
        if self.module.definition().serialization().is_none() {
            return Ok(());
        }
        {
            let mut pending = lock(&self.pending_serialized_state);
            if self.serialization.get().is_none() {
                *pending = Some(serialized.clone());
                return Ok(());
            }
        }
        self.apply_serialized_state(serialized)
    }

    fn apply_serialized_state(&self, state: &Value) -> Result<()> {
        let Some(serialization) = self.serialization.get() else {
            return Ok(());
        };
        (serialization.deserialize)(&self.state_store, state).map_err(|reason| {
            ModuleSystemError::Deserialization {
                module: self.module_name().to_string(),
                reason,
            }
            .into()
        })
    }

    /// Stop reacting to state and detach from the module. Idempotent.
    pub fn unload(&self) {
        if self.unloaded.swap(true, Ordering::SeqCst) {
            return;
        }
        for interface in [self.settings_to_view.get(), self.view_to_settings.get()]
            .into_iter()
            .flatten()
        {
            interface.dispose();
        }
        self.module.forget_instance(self);
        log::debug!("Unloaded instance '{}'", self.id);
    }

    /// Teardown hook run before the instance is dropped from any registry.
    pub fn before_destroy(&self) {
        self.unload();
        self.channel_manager.unregister_all_channels();
        self.channel_manager.unregister_all_receivers();
    }

    pub fn tile(&self) -> InstanceTile {
        if self.module.is_placeholder() {
            return InstanceTile::Fallback {
                reason: format!("Module '{}' was not found", self.module_name()),
                removable: true,
            };
        }
        match self.import_state() {
            ImportState::Failed => InstanceTile::Fallback {
                reason: self
                    .module
                    .import_error()
                    .unwrap_or_else(|| "Module failed to import".to_string()),
                removable: true,
            },
            ImportState::Imported if self.is_initialized() => InstanceTile::Ready,
            _ => InstanceTile::Pending,
        }
    }

    /// One-line summary from the module's view, once it can render.
    pub fn view_summary(&self) -> Option<String> {
        if !self.is_initialized() {
            return None;
        }
        self.module
            .components()
            .map(|components| components.view.render_summary(&self.state_store))
    }

    pub(crate) fn notify_import_state(&self) {
        self.delegate.notify_subscribers(ModuleInstanceTopic::ImportState);
    }
}

impl PublishSubscribe<ModuleInstanceTopic> for ModuleInstance {
    fn publish_subscribe_delegate(&self) -> &PublishSubscribeDelegate<ModuleInstanceTopic> {
        &self.delegate
    }

    fn snapshot(&self, topic: ModuleInstanceTopic) -> ModuleInstanceSnapshot {
        match topic {
            ModuleInstanceTopic::Title => ModuleInstanceSnapshot::Title(self.title()),
            ModuleInstanceTopic::ImportState => {
                ModuleInstanceSnapshot::ImportState(self.import_state())
            }
            ModuleInstanceTopic::SyncedSettings => {
                ModuleInstanceSnapshot::SyncedSettings(self.synced_settings())
            }
            ModuleInstanceTopic::Initialized => {
                ModuleInstanceSnapshot::Initialized(self.is_initialized())
            }
        }
    }
}

impl fmt::Debug for ModuleInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleInstance")
            .field("id", &self.id)
            .field("module", &self.module_name())
            .field("initialized", &self.is_initialized())
            .finish()
    }
}
