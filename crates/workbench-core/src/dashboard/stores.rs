use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::module_system::{ModuleDefinition, ModuleStateStore};
use crate::utils::lock;

/// Per-instance state slices owned by a dashboard.
#[derive(Debug, Default)]
pub struct InstanceStateStores {
    stores: Mutex<HashMap<String, Arc<ModuleStateStore>>>,
}

impl InstanceStateStores {
    pub fn new() -> Self {
        Self::default()
    }

    /// A fresh slice for `instance_id`, replacing any previous one.
    pub fn allocate(&self, instance_id: &str, definition: &ModuleDefinition) -> Arc<ModuleStateStore> {
        let store = Arc::new(definition.make_state_store());
        lock(&self.stores).insert(instance_id.to_string(), Arc::clone(&store));
        store
    }

    pub fn get(&self, instance_id: &str) -> Option<Arc<ModuleStateStore>> {
        lock(&self.stores).get(instance_id).cloned()
    }

    pub fn release(&self, instance_id: &str) -> bool {
        lock(&self.stores).remove(instance_id).is_some()
    }

    pub fn release_all(&self) {
        lock(&self.stores).clear();
    }

    pub fn len(&self) -> usize {
        lock(&self.stores).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.stores).is_empty()
    }
}
