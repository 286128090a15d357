use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::channels::{ChannelDefinition, ReceiverDefinition};
use crate::module_system::error::ModuleSystemError;
use crate::module_system::sync::SyncSettingKey;
use crate::state::{StateKeyOptions, StateKeySpec, StateStore};

/// Isolated state of one module instance: JSON values under string keys.
pub type ModuleStateStore = StateStore<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModuleCategory {
    Main,
    Sub,
    Debug,
}

impl fmt::Display for ModuleCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ModuleCategory::Main => "main",
            ModuleCategory::Sub => "sub",
            ModuleCategory::Debug => "debug",
        };
        f.pad(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModuleDevState {
    Prod,
    Beta,
    Dev,
}

impl fmt::Display for ModuleDevState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ModuleDevState::Prod => "prod",
            ModuleDevState::Beta => "beta",
            ModuleDevState::Dev => "dev",
        };
        f.pad(label)
    }
}

pub type DerivationFn = Arc<dyn Fn(&ModuleStateStore) -> Value + Send + Sync>;

/// One derived interface value and the state keys it reads.
#[derive(Clone)]
pub struct Derivation {
    pub key: String,
    pub sources: Vec<String>,
    pub derive: DerivationFn,
}

impl fmt::Debug for Derivation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Derivation")
            .field("key", &self.key)
            .field("sources", &self.sources)
            .finish_non_exhaustive()
    }
}

/// Declarative description of a settings-to-view or view-to-settings interface.
#[derive(Debug, Clone, Default)]
pub struct InterfaceInitialization {
    derivations: Vec<Derivation>,
}

impl InterfaceInitialization {
    pub fn new() -> Self {
        Self::default()
    }

    /// Expose `key`, recomputed by `derive` whenever one of `sources` changes.
    pub fn derive<F>(mut self, key: impl Into<String>, sources: &[&str], derive: F) -> Self
    where
        F: Fn(&ModuleStateStore) -> Value + Send + Sync + 'static,
    {
        self.derivations.push(Derivation {
            key: key.into(),
            sources: sources.iter().map(|s| s.to_string()).collect(),
            derive: Arc::new(derive),
        });
        self
    }

    /// Expose a state key unchanged under `key`.
    pub fn mirror(self, key: impl Into<String>, source: &str) -> Self {
        let source_key = source.to_string();
        self.derive(key, &[source], move |store| {
            store.get_value(&source_key).unwrap_or(Value::Null)
        })
    }

    pub fn derivations(&self) -> &[Derivation] {
        &self.derivations
    }
}

pub type SerializeStateFn = Arc<dyn Fn(&ModuleStateStore) -> Value + Send + Sync>;
pub type DeserializeStateFn =
    Arc<dyn Fn(&ModuleStateStore, &Value) -> Result<(), String> + Send + Sync>;

/// Functions converting an instance's state to and from its persisted form.
#[derive(Clone)]
pub struct ModuleSerialization {
    pub serialize: SerializeStateFn,
    pub deserialize: DeserializeStateFn,
    keys: Vec<String>,
}

impl ModuleSerialization {
    pub fn new<S, D>(serialize: S, deserialize: D) -> Self
    where
        S: Fn(&ModuleStateStore) -> Value + Send + Sync + 'static,
        D: Fn(&ModuleStateStore, &Value) -> Result<(), String> + Send + Sync + 'static,
    {
        Self {
            serialize: Arc::new(serialize),
            deserialize: Arc::new(deserialize),
            keys: Vec::new(),
        }
    }

    /// Persist the listed state keys as one JSON object.
    ///
    /// Restoring ignores unknown fields and leaves absent keys untouched.
    pub fn json_keys(keys: &[&str]) -> Self {
        let keys: Vec<String> = keys.iter().map(|k| k.to_string()).collect();
        let ser_keys = keys.clone();
        let de_keys = keys.clone();
        let mut serialization = Self::new(
            move |store| {
                let object: Map<String, Value> = ser_keys
                    .iter()
                    .filter_map(|key| store.get_value(key).ok().map(|v| (key.clone(), v)))
                    .collect();
                Value::Object(object)
            },
            move |store, value| {
                let object = value
                    .as_object()
                    .ok_or_else(|| "expected a JSON object".to_string())?;
                for key in &de_keys {
                    if let Some(v) = object.get(key) {
                        store.set_value(key, v.clone()).map_err(|e| e.to_string())?;
                    }
                }
                Ok(())
            },
        );
        serialization.keys = keys;
        serialization
    }
}

impl fmt::Debug for ModuleSerialization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleSerialization")
            .field("keys", &self.keys)
            .finish_non_exhaustive()
    }
}

/// Everything the workbench knows about a module before it is imported.
#[derive(Debug, Clone)]
pub struct ModuleDefinition {
    name: String,
    default_title: String,
    description: Option<String>,
    category: ModuleCategory,
    dev_state: ModuleDevState,
    state_schema: Vec<StateKeySpec<String, Value>>,
    channels: Vec<ChannelDefinition>,
    receivers: Vec<ReceiverDefinition>,
    sync_settings: Vec<SyncSettingKey>,
    settings_to_view: Option<InterfaceInitialization>,
    view_to_settings: Option<InterfaceInitialization>,
    serialization: Option<ModuleSerialization>,
}

impl ModuleDefinition {
    pub fn builder(name: impl Into<String>) -> ModuleDefinitionBuilder {
        let name = name.into();
        ModuleDefinitionBuilder {
            definition: ModuleDefinition {
                default_title: name.clone(),
                name,
                description: None,
                category: ModuleCategory::Main,
                dev_state: ModuleDevState::Prod,
                state_schema: Vec::new(),
                channels: Vec::new(),
                receivers: Vec::new(),
                sync_settings: Vec::new(),
                settings_to_view: None,
                view_to_settings: None,
                serialization: None,
            },
        }
    }

    /// Minimal definition standing in for a module that is not registered.
    pub(crate) fn placeholder(name: &str) -> Self {
        let mut definition = Self::builder(name).definition;
        definition.default_title = format!("{name} (not found)");
        definition.dev_state = ModuleDevState::Dev;
        definition
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn default_title(&self) -> &str {
        &self.default_title
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn category(&self) -> ModuleCategory {
        self.category
    }

    pub fn dev_state(&self) -> ModuleDevState {
        self.dev_state
    }

    pub fn channels(&self) -> &[ChannelDefinition] {
        &self.channels
    }

    pub fn receivers(&self) -> &[ReceiverDefinition] {
        &self.receivers
    }

    pub fn sync_settings(&self) -> &[SyncSettingKey] {
        &self.sync_settings
    }

    pub fn supports_sync(&self, key: SyncSettingKey) -> bool {
        self.sync_settings.contains(&key)
    }

    pub fn settings_to_view(&self) -> Option<&InterfaceInitialization> {
        self.settings_to_view.as_ref()
    }

    pub fn view_to_settings(&self) -> Option<&InterfaceInitialization> {
        self.view_to_settings.as_ref()
    }

    pub fn serialization(&self) -> Option<&ModuleSerialization> {
        self.serialization.as_ref()
    }

    pub fn state_keys(&self) -> impl Iterator<Item = &str> {
        self.state_schema.iter().map(|spec| spec.key.as_str())
    }

    /// A fresh state store seeded with the schema defaults.
    pub fn make_state_store(&self) -> ModuleStateStore {
        StateStore::new(self.state_schema.iter().cloned())
    }
}

pub struct ModuleDefinitionBuilder {
    definition: ModuleDefinition,
}

impl ModuleDefinitionBuilder {
    pub fn default_title(mut self, title: impl Into<String>) -> Self {
        self.definition.default_title = title.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.definition.description = Some(description.into());
        self
    }

    pub fn category(mut self, category: ModuleCategory) -> Self {
        self.definition.category = category;
        self
    }

    pub fn dev_state(mut self, dev_state: ModuleDevState) -> Self {
        self.definition.dev_state = dev_state;
        self
    }

    pub fn state(self, key: impl Into<String>, default: Value) -> Self {
        self.state_with_options(key, default, StateKeyOptions::default())
    }

    pub fn state_with_options(
        mut self,
        key: impl Into<String>,
        default: Value,
        options: StateKeyOptions,
    ) -> Self {
        self.definition
            .state_schema
            .push(StateKeySpec::new(key.into(), default).with_options(options));
        self
    }

    pub fn channel(mut self, channel: ChannelDefinition) -> Self {
        self.definition.channels.push(channel);
        self
    }

    pub fn receiver(mut self, receiver: ReceiverDefinition) -> Self {
        self.definition.receivers.push(receiver);
        self
    }

    pub fn sync_settings(mut self, keys: impl IntoIterator<Item = SyncSettingKey>) -> Self {
        for key in keys {
            if !self.definition.sync_settings.contains(&key) {
                self.definition.sync_settings.push(key);
            }
        }
        self
    }

    pub fn settings_to_view(mut self, interface: InterfaceInitialization) -> Self {
        self.definition.settings_to_view = Some(interface);
        self
    }

    pub fn view_to_settings(mut self, interface: InterfaceInitialization) -> Self {
        self.definition.view_to_settings = Some(interface);
        self
    }

    pub fn serialization(mut self, serialization: ModuleSerialization) -> Self {
        self.definition.serialization = Some(serialization);
        self
    }

    /// Check that every key referenced by interfaces and serialization is declared.
    pub fn build(self) -> Result<ModuleDefinition, ModuleSystemError> {
        let definition = self.definition;
        let invalid = |reason: String| ModuleSystemError::InvalidDefinition {
            module: definition.name.clone(),
            reason,
        };

        if definition.name.trim().is_empty() {
            return Err(invalid("module name is empty".to_string()));
        }

        let mut declared = HashSet::new();
        for spec in &definition.state_schema {
            if !declared.insert(spec.key.as_str()) {
                return Err(invalid(format!("state key '{}' declared twice", spec.key)));
            }
        }

        let interfaces = [
            ("settingsToView", &definition.settings_to_view),
            ("viewToSettings", &definition.view_to_settings),
        ];
        for (label, interface) in interfaces {
            let Some(interface) = interface else { continue };
            let mut keys = HashSet::new();
            for derivation in interface.derivations() {
                if !keys.insert(derivation.key.as_str()) {
                    return Err(invalid(format!(
                        "{label} exposes '{}' twice",
                        derivation.key
                    )));
                }
                if let Some(missing) = derivation
                    .sources
                    .iter()
                    .find(|source| !declared.contains(source.as_str()))
                {
                    return Err(invalid(format!(
                        "{label} key '{}' reads undeclared state '{missing}'",
                        derivation.key
                    )));
                }
            }
        }

        if let Some(serialization) = &definition.serialization {
            if let Some(missing) = serialization
                .keys
                .iter()
                .find(|key| !declared.contains(key.as_str()))
            {
                return Err(invalid(format!("serialization uses undeclared state '{missing}'")));
            }
        }

        let mut channel_ids = HashSet::new();
        for channel in &definition.channels {
            if !channel_ids.insert(channel.id_string.as_str()) {
                return Err(invalid(format!("channel '{}' declared twice", channel.id_string)));
            }
        }

        Ok(definition)
    }
}
