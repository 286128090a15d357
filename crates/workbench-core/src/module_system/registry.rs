use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Arc, Mutex};

use crate::kernel::error::Result;
use crate::module_system::definition::ModuleDefinition;
use crate::module_system::error::ModuleSystemError;
use crate::module_system::loader::ModuleLoader;
use crate::module_system::module::Module;
use crate::utils::lock;

/// Outcome of looking a module up by name.
#[derive(Debug, Clone)]
pub enum ModuleLookup {
    Found(Arc<Module>),
    NotFound(String),
}

/// Registry mapping module names to [`Module`]s.
///
/// Owned by the application root and handed to whoever needs it.
pub struct ModuleRegistry {
    loader: Arc<dyn ModuleLoader>,
    modules: Mutex<BTreeMap<String, Arc<Module>>>,
    placeholders: Mutex<HashMap<String, Arc<Module>>>,
}

impl ModuleRegistry {
    pub fn new(loader: Arc<dyn ModuleLoader>) -> Self {
        Self {
            loader,
            modules: Mutex::new(BTreeMap::new()),
            placeholders: Mutex::new(HashMap::new()),
        }
    }

    pub fn register(&self, definition: ModuleDefinition) -> Result<Arc<Module>> {
        let mut modules = lock(&self.modules);
        let name = definition.name().to_string();
        if modules.contains_key(&name) {
            return Err(ModuleSystemError::AlreadyRegistered { name }.into());
        }
        let module = Module::new(definition, Arc::clone(&self.loader));
        modules.insert(name.clone(), Arc::clone(&module));
        log::info!("Registered module '{}'", name);
        Ok(module)
    }

    pub fn get(&self, name: &str) -> Option<Arc<Module>> {
        lock(&self.modules).get(name).cloned()
    }

    pub fn resolve(&self, name: &str) -> ModuleLookup {
        match self.get(name) {
            Some(module) => ModuleLookup::Found(module),
            None => ModuleLookup::NotFound(name.to_string()),
        }
    }

    /// Like [`ModuleRegistry::get`], but a missing name is an error.
    pub fn require(&self, name: &str) -> Result<Arc<Module>> {
        self.get(name).ok_or_else(|| {
            ModuleSystemError::NotRegistered {
                name: name.to_string(),
            }
            .into()
        })
    }

    /// The placeholder standing in for `name`, shared by all its instances.
    pub fn placeholder_for(&self, name: &str) -> Arc<Module> {
        lock(&self.placeholders)
            .entry(name.to_string())
            .or_insert_with(|| {
                log::warn!("Module '{}' is not registered, using a placeholder", name);
                Module::not_found(name)
            })
            .clone()
    }

    /// Registered modules sorted by name.
    pub fn modules(&self) -> Vec<Arc<Module>> {
        lock(&self.modules).values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        lock(&self.modules).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.modules).is_empty()
    }
}

impl fmt::Debug for ModuleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleRegistry")
            .field("modules", &lock(&self.modules).keys().collect::<Vec<_>>())
            .field("loader", &self.loader)
            .finish()
    }
}
