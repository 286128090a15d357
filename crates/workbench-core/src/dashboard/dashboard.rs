use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Mutex};

use crate::event::{PublishSubscribe, PublishSubscribeDelegate, Topic};
use crate::kernel::constants::DEFAULT_DASHBOARD_NAME;
use crate::kernel::error::Result;
use crate::dashboard::error::DashboardError;
use crate::dashboard::layout::{LayoutBox, LayoutElement};
use crate::dashboard::persisted::{LayoutInfo, SerializedDashboard, SerializedModuleInstance};
use crate::dashboard::stores::InstanceStateStores;
use crate::dashboard::template::Template;
use crate::module_system::{
    MessageSeverity, Module, ModuleInstance, ModuleLookup, ModuleRegistry, StatusSource,
};
use crate::utils::{lock, new_id};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DashboardTopic {
    ModuleInstances,
    Layout,
    ActiveModuleInstanceId,
}

#[derive(Debug, Clone)]
pub enum DashboardSnapshot {
    ModuleInstances(Vec<Arc<ModuleInstance>>),
    Layout(Vec<LayoutElement>),
    ActiveModuleInstanceId(Option<String>),
}

impl Topic for DashboardTopic {
    type Snapshot = DashboardSnapshot;
}

#[derive(Default)]
struct DashboardState {
    name: String,
    description: Option<String>,
    layout: Vec<LayoutElement>,
    instances: Vec<Arc<ModuleInstance>>,
    active_module_instance_id: Option<String>,
}

/// A page of module instances and their layout.
pub struct Dashboard {
    id: String,
    registry: Arc<ModuleRegistry>,
    state: Mutex<DashboardState>,
    stores: InstanceStateStores,
    delegate: PublishSubscribeDelegate<DashboardTopic>,
}

impl Dashboard {
    pub fn new(registry: Arc<ModuleRegistry>) -> Self {
        Self::with_id(registry, new_id(), DEFAULT_DASHBOARD_NAME)
    }

    pub fn with_id(registry: Arc<ModuleRegistry>, id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            registry,
            state: Mutex::new(DashboardState {
                name: name.into(),
                ..DashboardState::default()
            }),
            stores: InstanceStateStores::new(),
            delegate: PublishSubscribeDelegate::new(),
        }
    }

    /// Rebuild a dashboard from its persisted form, keeping its id.
    pub fn from_persisted(registry: Arc<ModuleRegistry>, payload: &SerializedDashboard) -> Result<Self> {
        let dashboard = Self::with_id(registry, payload.id.clone(), payload.name.clone());
        dashboard.deserialize_state(payload)?;
        Ok(dashboard)
    }

    /// Build a dashboard holding one instance per template entry.
    pub fn from_template(registry: Arc<ModuleRegistry>, template: &Template) -> Self {
        let dashboard = Self::with_id(registry, new_id(), template.name.clone());
        dashboard.set_description(Some(template.description.clone()));
        for entry in &template.module_instances {
            let instance = dashboard.make_and_add_module_instance(&entry.module_name, entry.layout);
            for key in &entry.synced_settings {
                if let Err(e) = instance.add_synced_setting(*key) {
                    log::warn!("Template '{}': {}", template.name, e);
                }
            }
            if entry.initial_state.is_some() {
                let mut state = instance.get_full_state();
                state.serialized_state = entry.initial_state.clone();
                if let Err(e) = instance.set_full_state(&state) {
                    log::warn!("Template '{}': {}", template.name, e);
                }
            }
        }
        dashboard
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> String {
        lock(&self.state).name.clone()
    }

    pub fn set_name(&self, name: impl Into<String>) {
        lock(&self.state).name = name.into();
    }

    pub fn description(&self) -> Option<String> {
        lock(&self.state).description.clone()
    }

    pub fn set_description(&self, description: Option<String>) {
        lock(&self.state).description = description;
    }

    /// Instances in creation order.
    pub fn module_instances(&self) -> Vec<Arc<ModuleInstance>> {
        lock(&self.state).instances.clone()
    }

    pub fn module_instance(&self, id: &str) -> Option<Arc<ModuleInstance>> {
        lock(&self.state)
            .instances
            .iter()
            .find(|instance| instance.id() == id)
            .cloned()
    }

    pub fn layout(&self) -> Vec<LayoutElement> {
        lock(&self.state).layout.clone()
    }

    pub fn active_module_instance_id(&self) -> Option<String> {
        lock(&self.state).active_module_instance_id.clone()
    }

    pub fn active_module_instance(&self) -> Option<Arc<ModuleInstance>> {
        self.active_module_instance_id()
            .and_then(|id| self.module_instance(&id))
    }

    /// Select the active instance. `id` must belong to this dashboard.
    pub fn set_active_module_instance_id(&self, id: Option<&str>) -> Result<()> {
        {
            let mut state = lock(&self.state);
            if let Some(id) = id {
                if !state.instances.iter().any(|instance| instance.id() == id) {
                    return Err(DashboardError::InstanceNotFound {
                        dashboard_id: self.id.clone(),
                        instance_id: id.to_string(),
                    }
                    .into());
                }
            }
            let id = id.map(str::to_string);
            if state.active_module_instance_id == id {
                return Ok(());
            }
            state.active_module_instance_id = id;
        }
        self.delegate.notify_subscribers(DashboardTopic::ActiveModuleInstanceId);
        Ok(())
    }

    /// Allocate a state slice and create an instance of `module`. The caller
    /// adds it to the dashboard.
    fn create_instance(&self, module: &Arc<Module>, id: String) -> Arc<ModuleInstance> {
        let store = self.stores.allocate(&id, module.definition());
        module.make_instance(id, store)
    }

    /// Create an instance of a registered module with an optional fixed id.
    ///
    /// Unlike [`Dashboard::make_and_add_module_instance`] an unknown module is
    /// an error here. No layout element is added.
    pub fn register_module_instance(&self, module_name: &str, id: Option<String>) -> Result<Arc<ModuleInstance>> {
        let module = self.registered_module(module_name)?;
        let instance = self.create_instance(&module, id.unwrap_or_else(new_id));
        lock(&self.state).instances.push(Arc::clone(&instance));
        self.delegate.notify_subscribers(DashboardTopic::ModuleInstances);
        Ok(instance)
    }

    fn registered_module(&self, module_name: &str) -> Result<Arc<Module>> {
        match self.registry.resolve(module_name) {
            ModuleLookup::Found(module) => Ok(module),
            ModuleLookup::NotFound(module_name) => Err(DashboardError::UnregisteredModule {
                dashboard_id: self.id.clone(),
                module_name,
            }
            .into()),
        }
    }

    /// Create an instance with a fresh id, place it at `layout` and make it active.
    ///
    /// An unknown module name yields a placeholder instance instead of an error.
    pub fn make_and_add_module_instance(&self, module_name: &str, layout: LayoutBox) -> Arc<ModuleInstance> {
        let module = match self.registry.resolve(module_name) {
            ModuleLookup::Found(module) => module,
            ModuleLookup::NotFound(name) => self.registry.placeholder_for(&name),
        };
        let instance = self.create_instance(&module, new_id());
        {
            let mut state = lock(&self.state);
            state.instances.push(Arc::clone(&instance));
            state
                .layout
                .push(LayoutElement::new(module_name, layout).with_instance_id(instance.id()));
            state.active_module_instance_id = Some(instance.id().to_string());
        }
        log::info!(
            "Added instance '{}' of '{}' to dashboard '{}'",
            instance.id(),
            module_name,
            self.id
        );
        self.delegate.notify_subscribers(DashboardTopic::ModuleInstances);
        self.delegate.notify_subscribers(DashboardTopic::Layout);
        self.delegate.notify_subscribers(DashboardTopic::ActiveModuleInstanceId);
        instance
    }

    /// Tear down and drop an instance. Collections are filtered even when the
    /// id is unknown.
    pub fn remove_module_instance(&self, id: &str) {
        if let Some(instance) = self.module_instance(id) {
            instance.before_destroy();
        } else {
            log::warn!("Removing unknown instance '{}' from dashboard '{}'", id, self.id);
        }

        let active_cleared = {
            let mut state = lock(&self.state);
            state.instances.retain(|instance| instance.id() != id);
            state
                .layout
                .retain(|element| element.module_instance_id.as_deref() != Some(id));
            let cleared = state.active_module_instance_id.as_deref() == Some(id);
            if cleared {
                state.active_module_instance_id = None;
            }
            cleared
        };
        self.stores.release(id);
        log::info!("Removed instance '{}' from dashboard '{}'", id, self.id);

        self.delegate.notify_subscribers(DashboardTopic::ModuleInstances);
        self.delegate.notify_subscribers(DashboardTopic::Layout);
        if active_cleared {
            self.delegate.notify_subscribers(DashboardTopic::ActiveModuleInstanceId);
        }
    }

    /// Replace the layout. Elements may only reference instances of this dashboard.
    pub fn set_layout(&self, layout: Vec<LayoutElement>) -> Result<()> {
        {
            let mut state = lock(&self.state);
            if let Some(unknown) = layout
                .iter()
                .filter_map(|element| element.module_instance_id.as_deref())
                .find(|id| !state.instances.iter().any(|instance| instance.id() == *id))
            {
                return Err(DashboardError::InstanceNotFound {
                    dashboard_id: self.id.clone(),
                    instance_id: unknown.to_string(),
                }
                .into());
            }
            state.layout = layout;
        }
        self.delegate.notify_subscribers(DashboardTopic::Layout);
        Ok(())
    }

    /// Run `before_destroy` on every instance and drop them all.
    pub fn clear_layout(&self) {
        self.teardown();
        self.delegate.notify_subscribers(DashboardTopic::ModuleInstances);
        self.delegate.notify_subscribers(DashboardTopic::Layout);
        self.delegate.notify_subscribers(DashboardTopic::ActiveModuleInstanceId);
    }

    fn teardown(&self) {
        let instances = {
            let mut state = lock(&self.state);
            state.layout.clear();
            state.active_module_instance_id = None;
            std::mem::take(&mut state.instances)
        };
        for instance in &instances {
            instance.before_destroy();
        }
        self.stores.release_all();
    }

    pub fn serialize_state(&self) -> Result<SerializedDashboard> {
        let state = lock(&self.state);
        let module_instances = state
            .instances
            .iter()
            .map(|instance| {
                let element = state
                    .layout
                    .iter()
                    .find(|element| element.module_instance_id.as_deref() == Some(instance.id()))
                    .ok_or_else(|| DashboardError::MissingLayoutElement {
                        instance_id: instance.id().to_string(),
                    })?;
                Ok(SerializedModuleInstance {
                    state: instance.get_full_state(),
                    layout_info: LayoutInfo::from_element(element),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(SerializedDashboard {
            id: self.id.clone(),
            name: state.name.clone(),
            description: state.description.clone(),
            module_instances,
        })
    }

    /// Replace the contents with `payload`, keeping persisted instance ids.
    ///
    /// Every module named in the payload must be registered and every
    /// instance id must be unique. Nothing is touched when either fails.
    pub fn deserialize_state(&self, payload: &SerializedDashboard) -> Result<()> {
        let mut seen = HashSet::with_capacity(payload.module_instances.len());
        if let Some(entry) = payload
            .module_instances
            .iter()
            .find(|entry| !seen.insert(entry.state.id.as_str()))
        {
            return Err(DashboardError::DuplicateInstanceId {
                dashboard_id: payload.id.clone(),
                instance_id: entry.state.id.clone(),
            }
            .into());
        }

        let modules = payload
            .module_instances
            .iter()
            .map(|entry| self.registered_module(&entry.state.name))
            .collect::<Result<Vec<_>>>()?;

        self.teardown();

        let mut instances = Vec::with_capacity(modules.len());
        let mut layout = Vec::with_capacity(modules.len());
        for (entry, module) in payload.module_instances.iter().zip(&modules) {
            let instance = self.create_instance(module, entry.state.id.clone());
            if let Err(e) = instance.set_full_state(&entry.state) {
                log::warn!("Instance '{}' could not restore its state: {}", instance.id(), e);
                instance.status_controller().add_message(
                    StatusSource::Settings,
                    MessageSeverity::Error,
                    e.to_string(),
                );
            }
            layout.push(LayoutElement {
                module_instance_id: Some(entry.state.id.clone()),
                module_name: entry.state.name.clone(),
                layout: entry.layout_info.layout,
                minimized: Some(entry.layout_info.minimized),
                maximized: Some(entry.layout_info.maximized),
            });
            instances.push(instance);
        }

        for (entry, instance) in payload.module_instances.iter().zip(&instances) {
            for subscription in &entry.state.data_channel_receiver_subscriptions {
                let Some(source) = instances
                    .iter()
                    .find(|i| i.id() == subscription.listens_to_module_instance_id)
                else {
                    log::warn!(
                        "Skipping subscription of '{}' to missing instance '{}'",
                        instance.id(),
                        subscription.listens_to_module_instance_id
                    );
                    continue;
                };
                if let Err(e) = instance.channel_manager().connect(
                    &subscription.id_string,
                    source.channel_manager(),
                    &subscription.channel_id_string,
                    subscription.content_id_strings.clone(),
                ) {
                    log::warn!("Skipping subscription of '{}': {}", instance.id(), e);
                }
            }
        }

        {
            let mut state = lock(&self.state);
            state.name = payload.name.clone();
            state.description = payload.description.clone();
            state.instances = instances;
            state.layout = layout;
            state.active_module_instance_id = None;
        }
        log::info!(
            "Restored dashboard '{}' with {} instance(s)",
            self.id,
            payload.module_instances.len()
        );
        self.delegate.notify_subscribers(DashboardTopic::ModuleInstances);
        self.delegate.notify_subscribers(DashboardTopic::Layout);
        self.delegate.notify_subscribers(DashboardTopic::ActiveModuleInstanceId);
        Ok(())
    }

    /// Verify that instances and layout elements match one to one.
    pub fn check_consistency(&self) -> Result<()> {
        let state = lock(&self.state);
        let inconsistent = |reason: String| DashboardError::Inconsistent {
            dashboard_id: self.id.clone(),
            reason,
        };
        for element in &state.layout {
            if let Some(id) = &element.module_instance_id {
                if !state.instances.iter().any(|instance| instance.id() == id) {
                    return Err(inconsistent(format!("layout element references missing instance '{id}'")).into());
                }
            }
        }
        for instance in &state.instances {
            let slots = state
                .layout
                .iter()
                .filter(|element| element.module_instance_id.as_deref() == Some(instance.id()))
                .count();
            if slots != 1 {
                return Err(inconsistent(format!(
                    "instance '{}' has {slots} layout elements",
                    instance.id()
                ))
                .into());
            }
        }
        if let Some(active) = &state.active_module_instance_id {
            if !state.instances.iter().any(|instance| instance.id() == active) {
                return Err(inconsistent(format!("active instance '{active}' is missing")).into());
            }
        }
        Ok(())
    }
}

impl PublishSubscribe<DashboardTopic> for Dashboard {
    fn publish_subscribe_delegate(&self) -> &PublishSubscribeDelegate<DashboardTopic> {
        &self.delegate
    }

    fn snapshot(&self, topic: DashboardTopic) -> DashboardSnapshot {
        match topic {
            DashboardTopic::ModuleInstances => {
                DashboardSnapshot::ModuleInstances(self.module_instances())
            }
            DashboardTopic::Layout => DashboardSnapshot::Layout(self.layout()),
            DashboardTopic::ActiveModuleInstanceId => {
                DashboardSnapshot::ActiveModuleInstanceId(self.active_module_instance_id())
            }
        }
    }
}

impl fmt::Debug for Dashboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = lock(&self.state);
        f.debug_struct("Dashboard")
            .field("id", &self.id)
            .field("name", &state.name)
            .field("instances", &state.instances.len())
            .field("active", &state.active_module_instance_id)
            .finish()
    }
}
