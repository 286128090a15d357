use std::fmt;
use std::sync::{Arc, Mutex, OnceLock, Weak};

use serde::{Deserialize, Serialize};
use tokio::runtime::Handle;
use tokio::sync::watch;

use crate::module_system::definition::{ModuleDefinition, ModuleStateStore};
use crate::module_system::instance::ModuleInstance;
use crate::module_system::loader::{ModuleComponents, ModuleLoader};
use crate::utils::lock;

/// Import progress of a module's components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImportState {
    NotImported,
    Importing,
    Imported,
    Failed,
}

impl ImportState {
    pub fn is_settled(&self) -> bool {
        matches!(self, ImportState::Imported | ImportState::Failed)
    }
}

impl fmt::Display for ImportState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ImportState::NotImported => "not imported",
            ImportState::Importing => "importing",
            ImportState::Imported => "imported",
            ImportState::Failed => "failed",
        };
        f.pad(label)
    }
}

/// A registered module: its definition plus the one-shot import of its
/// components, shared by every instance.
///
/// The first [`Module::make_instance`] starts the import on the current tokio
/// runtime. Instances created while it runs are initialized together once it
/// completes. A failed import is terminal.
pub struct Module {
    definition: ModuleDefinition,
    placeholder: bool,
    loader: Option<Arc<dyn ModuleLoader>>,
    import_state: watch::Sender<ImportState>,
    /// Raised once the import has settled and pending instances are initialized
    settled: watch::Sender<bool>,
    import_error: Mutex<Option<String>>,
    components: OnceLock<ModuleComponents>,
    instances: Mutex<Vec<Weak<ModuleInstance>>>,
}

impl Module {
    pub fn new(definition: ModuleDefinition, loader: Arc<dyn ModuleLoader>) -> Arc<Self> {
        Arc::new(Self {
            definition,
            placeholder: false,
            loader: Some(loader),
            import_state: watch::channel(ImportState::NotImported).0,
            settled: watch::channel(false).0,
            import_error: Mutex::new(None),
            components: OnceLock::new(),
            instances: Mutex::new(Vec::new()),
        })
    }

    /// Stand-in for a module name nothing is registered under.
    ///
    /// It never imports anything. Its instances render a fallback tile.
    pub fn not_found(name: &str) -> Arc<Self> {
        Arc::new(Self {
            definition: ModuleDefinition::placeholder(name),
            placeholder: true,
            loader: None,
            import_state: watch::channel(ImportState::Imported).0,
            settled: watch::channel(true).0,
            import_error: Mutex::new(None),
            components: OnceLock::new(),
            instances: Mutex::new(Vec::new()),
        })
    }

    pub fn name(&self) -> &str {
        self.definition.name()
    }

    pub fn definition(&self) -> &ModuleDefinition {
        &self.definition
    }

    pub fn is_placeholder(&self) -> bool {
        self.placeholder
    }

    pub fn import_state(&self) -> ImportState {
        *self.import_state.borrow()
    }

    /// Why the import failed, once it has.
    pub fn import_error(&self) -> Option<String> {
        lock(&self.import_error).clone()
    }

    pub fn components(&self) -> Option<&ModuleComponents> {
        self.components.get()
    }

    pub fn watch_import_state(&self) -> watch::Receiver<ImportState> {
        self.import_state.subscribe()
    }

    /// Resolve once the import has settled and every instance pending at
    /// that point has been initialized. Waits for an import that has not been
    /// started yet as well.
    pub async fn wait_until_settled(&self) -> ImportState {
        let mut receiver = self.settled.subscribe();
        let _ = receiver.wait_for(|settled| *settled).await;
        self.import_state()
    }

    /// Live instances, in creation order.
    pub fn instances(&self) -> Vec<Arc<ModuleInstance>> {
        lock(&self.instances)
            .iter()
            .filter_map(Weak::upgrade)
            .collect()
    }

    pub fn make_instance(
        self: &Arc<Self>,
        id: impl Into<String>,
        state_store: Arc<ModuleStateStore>,
    ) -> Arc<ModuleInstance> {
        let instance = Arc::new(ModuleInstance::new(id.into(), Arc::clone(self), state_store));

        // Append before looking at the state so a concurrent completion
        // either sees this instance or we see `Imported`.
        {
            let mut instances = lock(&self.instances);
            instances.retain(|weak| weak.strong_count() > 0);
            instances.push(Arc::downgrade(&instance));
        }

        match self.import_state() {
            ImportState::Imported => instance.initialize(),
            ImportState::NotImported => self.maybe_import_self(),
            ImportState::Importing | ImportState::Failed => {}
        }
        instance
    }

    /// Drop `instance` from the pending list. Other instances that reuse its
    /// id stay registered.
    pub(crate) fn forget_instance(&self, instance: &ModuleInstance) {
        lock(&self.instances)
            .retain(|weak| weak.strong_count() > 0 && !std::ptr::eq(weak.as_ptr(), instance));
    }

    fn maybe_import_self(self: &Arc<Self>) {
        let started = self.import_state.send_if_modified(|state| {
            if *state == ImportState::NotImported {
                *state = ImportState::Importing;
                true
            } else {
                false
            }
        });
        if !started {
            return;
        }
        log::debug!("Importing module '{}'", self.name());
        self.notify_instances_import_state();

        match Handle::try_current() {
            Ok(handle) => {
                let module = Arc::clone(self);
                handle.spawn(async move { module.import_self().await });
            }
            Err(e) => {
                self.finish_import(Err(format!("no async runtime to import on: {e}")));
            }
        }
    }

    async fn import_self(self: Arc<Self>) {
        let outcome = match &self.loader {
            Some(loader) => match loader.resolve(self.name()).await {
                Some(load) => load().await.map_err(|e| e.to_string()),
                None => Err("no loader is registered for this module".to_string()),
            },
            None => Err("module has no loader".to_string()),
        };
        self.finish_import(outcome);
    }

    fn finish_import(&self, outcome: Result<ModuleComponents, String>) {
        match outcome {
            Ok(components) => {
                let _ = self.components.set(components);
                self.import_state.send_replace(ImportState::Imported);
                log::info!("Module '{}' imported", self.name());
                self.notify_instances_import_state();

                let pending = self.instances();
                log::debug!(
                    "Initializing {} pending instance(s) of '{}'",
                    pending.len(),
                    self.name()
                );
                for instance in pending {
                    instance.initialize();
                }
                self.settled.send_replace(true);
            }
            Err(reason) => {
                log::error!("Import of module '{}' failed: {}", self.name(), reason);
                *lock(&self.import_error) = Some(reason);
                self.import_state.send_replace(ImportState::Failed);
                self.notify_instances_import_state();
                self.settled.send_replace(true);
            }
        }
    }

    fn notify_instances_import_state(&self) {
        for instance in self.instances() {
            instance.notify_import_state();
        }
    }
}

impl fmt::Debug for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Module")
            .field("name", &self.name())
            .field("placeholder", &self.placeholder)
            .field("import_state", &self.import_state())
            .field("instances", &lock(&self.instances).len())
            .finish()
    }
}
