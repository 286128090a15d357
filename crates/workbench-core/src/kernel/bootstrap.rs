use std::fmt;
use std::sync::{Arc, Mutex, Weak};

use crate::dashboard::{Dashboard, DashboardError, SerializedDashboard, Template, TemplateRegistry};
use crate::event::{EventResult, HandlerId};
use crate::kernel::constants;
use crate::kernel::error::Result;
use crate::module_system::{Module, ModuleDefinition, ModuleLoader, ModuleRegistry};
use crate::services::{GuiEvent, GuiEventKind, GuiMessageBroker, WorkbenchServices};
use crate::storage::{
    read_or_default, write_json, KeyValueStore, LocalKeyValueStore, PersistedKey, WorkbenchConfig,
};
use crate::utils::lock;

struct Pages {
    dashboards: Vec<Arc<Dashboard>>,
    active: String,
}

/// Application root.
///
/// Owns the registries, the shared services and every dashboard (page). Layout
/// and selection are persisted through the key-value store.
pub struct Workbench {
    config: WorkbenchConfig,
    registry: Arc<ModuleRegistry>,
    templates: TemplateRegistry,
    services: Arc<WorkbenchServices>,
    broker: Arc<GuiMessageBroker>,
    storage: Arc<dyn KeyValueStore>,
    pages: Mutex<Pages>,
    remove_handler: HandlerId,
}

impl Workbench {
    /// Build a workbench with a single empty dashboard.
    pub fn new(
        config: WorkbenchConfig,
        loader: Arc<dyn ModuleLoader>,
        storage: Arc<dyn KeyValueStore>,
    ) -> Arc<Self> {
        log::info!("Initializing {} v{}", constants::APP_NAME, constants::APP_VERSION);
        let registry = Arc::new(ModuleRegistry::new(loader));
        let broker = if config.persist_gui_state {
            GuiMessageBroker::with_storage(Arc::clone(&storage))
        } else {
            GuiMessageBroker::new()
        };
        let broker = Arc::new(broker);
        let first = Arc::new(Dashboard::new(Arc::clone(&registry)));

        Arc::new_cyclic(|workbench: &Weak<Workbench>| {
            let workbench = workbench.clone();
            let remove_handler =
                broker.register_handler(GuiEventKind::RemoveModuleInstanceRequest, move |event| {
                    if let (Some(workbench), GuiEvent::RemoveModuleInstanceRequest { module_instance_id }) =
                        (workbench.upgrade(), event)
                    {
                        workbench.active_dashboard().remove_module_instance(module_instance_id);
                    }
                    EventResult::Continue
                });
            Self {
                config,
                registry,
                templates: TemplateRegistry::new(),
                services: Arc::new(WorkbenchServices::new()),
                broker,
                storage,
                pages: Mutex::new(Pages {
                    active: first.id().to_string(),
                    dashboards: vec![first],
                }),
                remove_handler,
            }
        })
    }

    /// Build a workbench persisting into `config.data_dir`.
    pub fn open(config: WorkbenchConfig, loader: Arc<dyn ModuleLoader>) -> Arc<Self> {
        log::info!("Using data directory: {}", config.data_dir.display());
        let storage = Arc::new(LocalKeyValueStore::new(config.data_dir.clone()));
        Self::new(config, loader, storage)
    }

    pub fn config(&self) -> &WorkbenchConfig {
        &self.config
    }

    pub fn module_registry(&self) -> &Arc<ModuleRegistry> {
        &self.registry
    }

    pub fn template_registry(&self) -> &TemplateRegistry {
        &self.templates
    }

    pub fn services(&self) -> &Arc<WorkbenchServices> {
        &self.services
    }

    pub fn gui_message_broker(&self) -> &Arc<GuiMessageBroker> {
        &self.broker
    }

    pub fn storage(&self) -> &Arc<dyn KeyValueStore> {
        &self.storage
    }

    pub fn register_module(&self, definition: ModuleDefinition) -> Result<Arc<Module>> {
        self.registry.register(definition)
    }

    pub fn register_template(&self, template: Template) {
        self.templates.register(template);
    }

    pub fn dashboards(&self) -> Vec<Arc<Dashboard>> {
        lock(&self.pages).dashboards.clone()
    }

    pub fn dashboard(&self, id: &str) -> Option<Arc<Dashboard>> {
        lock(&self.pages)
            .dashboards
            .iter()
            .find(|dashboard| dashboard.id() == id)
            .cloned()
    }

    pub fn active_dashboard_id(&self) -> String {
        lock(&self.pages).active.clone()
    }

    pub fn active_dashboard(&self) -> Arc<Dashboard> {
        // `pages` is never empty; the fallback only guards a broken invariant.
        let pages = lock(&self.pages);
        pages
            .dashboards
            .iter()
            .find(|dashboard| dashboard.id() == pages.active)
            .or_else(|| pages.dashboards.first())
            .cloned()
            .unwrap_or_else(|| Arc::new(Dashboard::new(Arc::clone(&self.registry))))
    }

    pub fn set_active_dashboard(&self, id: &str) -> Result<()> {
        let mut pages = lock(&self.pages);
        if !pages.dashboards.iter().any(|dashboard| dashboard.id() == id) {
            return Err(DashboardError::DashboardNotFound { id: id.to_string() }.into());
        }
        pages.active = id.to_string();
        Ok(())
    }

    /// Append an empty dashboard and make it active.
    pub fn add_dashboard(&self, name: &str) -> Arc<Dashboard> {
        let dashboard = Arc::new(Dashboard::with_id(
            Arc::clone(&self.registry),
            crate::utils::new_id(),
            name,
        ));
        self.push_active(Arc::clone(&dashboard));
        dashboard
    }

    fn push_active(&self, dashboard: Arc<Dashboard>) {
        let mut pages = lock(&self.pages);
        pages.active = dashboard.id().to_string();
        pages.dashboards.push(dashboard);
    }

    /// Build a new active dashboard from the template called `name`.
    pub fn apply_template(&self, name: &str) -> Result<Arc<Dashboard>> {
        let template = self
            .templates
            .get(name)
            .ok_or_else(|| DashboardError::TemplateNotFound { name: name.to_string() })?;
        let dashboard = Arc::new(Dashboard::from_template(Arc::clone(&self.registry), &template));
        log::info!("Applied template '{}' as dashboard '{}'", name, dashboard.id());
        self.push_active(Arc::clone(&dashboard));
        Ok(dashboard)
    }

    /// Persist every dashboard and the current selection.
    pub fn save(&self) -> Result<()> {
        let (dashboards, active) = {
            let pages = lock(&self.pages);
            (pages.dashboards.clone(), pages.active.clone())
        };
        let layout = dashboards
            .iter()
            .map(|dashboard| dashboard.serialize_state())
            .collect::<Result<Vec<SerializedDashboard>>>()?;
        let active_instance = self.active_dashboard().active_module_instance_id();

        let storage = self.storage.as_ref();
        write_json(storage, &PersistedKey::Layout, &layout)?;
        write_json(storage, &PersistedKey::ActiveDashboardId, &active)?;
        write_json(storage, &PersistedKey::ActiveModuleInstanceId, &active_instance)?;
        if self.config.persist_gui_state {
            self.broker.persist_all()?;
        }
        log::info!("Saved {} dashboard(s) to {}", layout.len(), storage.name());
        Ok(())
    }

    /// Replace all dashboards with the persisted ones.
    ///
    /// Missing or unreadable keys yield a single empty dashboard. A persisted
    /// dashboard naming an unregistered module is an error and leaves the
    /// current dashboards in place.
    pub fn load(&self) -> Result<()> {
        let storage = self.storage.as_ref();
        let layout: Vec<SerializedDashboard> =
            read_or_default(storage, &PersistedKey::Layout, Vec::new());
        let mut dashboards = layout
            .iter()
            .map(|payload| {
                Dashboard::from_persisted(Arc::clone(&self.registry), payload).map(Arc::new)
            })
            .collect::<Result<Vec<_>>>()?;
        if dashboards.is_empty() {
            log::debug!("No persisted layout, starting with an empty dashboard");
            dashboards.push(Arc::new(Dashboard::new(Arc::clone(&self.registry))));
        }

        let stored_active: Option<String> =
            read_or_default(storage, &PersistedKey::ActiveDashboardId, None);
        let active = stored_active
            .filter(|id| dashboards.iter().any(|dashboard| dashboard.id() == id))
            .unwrap_or_else(|| dashboards[0].id().to_string());

        let previous = {
            let mut pages = lock(&self.pages);
            let previous = std::mem::replace(&mut pages.dashboards, dashboards);
            pages.active = active;
            previous
        };
        for dashboard in previous {
            dashboard.clear_layout();
        }

        let active_instance: Option<String> =
            read_or_default(storage, &PersistedKey::ActiveModuleInstanceId, None);
        if let Some(id) = active_instance {
            if let Err(e) = self.active_dashboard().set_active_module_instance_id(Some(&id)) {
                log::warn!("Ignoring stored active module instance: {}", e);
            }
        }
        log::info!("Loaded {} dashboard(s)", layout.len());
        Ok(())
    }

    /// Route a GUI event through the broker.
    pub fn publish_gui_event(&self, event: &GuiEvent) -> EventResult {
        self.broker.publish_event(event)
    }
}

impl Drop for Workbench {
    fn drop(&mut self) {
        if let Err(e) = self.broker.unregister_handler(self.remove_handler) {
            log::debug!("Workbench handler already gone: {}", e);
        }
    }
}

impl fmt::Debug for Workbench {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pages = lock(&self.pages);
        f.debug_struct("Workbench")
            .field("modules", &self.registry.len())
            .field("dashboards", &pages.dashboards.len())
            .field("active", &pages.active)
            .field("storage", &self.storage.name())
            .finish()
    }
}
