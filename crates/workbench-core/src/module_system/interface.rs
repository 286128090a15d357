use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::event::Unsubscribe;
use crate::kernel::error::Result;
use crate::module_system::definition::{InterfaceInitialization, ModuleStateStore};
use crate::state::{StateKeyOptions, StateKeySpec, StateStore};

/// Read-only values derived from an instance's state, kept up to date as the
/// source keys change.
pub struct UniDirectionalInterface {
    values: Arc<StateStore<String, Value>>,
    subscriptions: Vec<Unsubscribe>,
}

impl UniDirectionalInterface {
    pub fn new(initialization: &InterfaceInitialization, source: &Arc<ModuleStateStore>) -> Result<Self> {
        let schema = initialization.derivations().iter().map(|derivation| {
            StateKeySpec::new(derivation.key.clone(), (derivation.derive)(source))
                .with_options(StateKeyOptions::deep_compare())
        });
        let values = Arc::new(StateStore::new(schema));

        let mut subscriptions = Vec::new();
        for derivation in initialization.derivations() {
            for source_key in &derivation.sources {
                let weak_source = Arc::downgrade(source);
                let weak_values = Arc::downgrade(&values);
                let key = derivation.key.clone();
                let derive = derivation.derive.clone();
                let handle = source.subscribe(source_key, move |_| {
                    let (Some(source), Some(values)) = (weak_source.upgrade(), weak_values.upgrade())
                    else {
                        return;
                    };
                    if let Err(e) = values.set_value(&key, derive(&source)) {
                        log::warn!("Failed to update interface value '{}': {}", key, e);
                    }
                });
                match handle {
                    Ok(handle) => subscriptions.push(handle),
                    Err(e) => {
                        subscriptions.iter().for_each(Unsubscribe::unsubscribe);
                        return Err(e.into());
                    }
                }
            }
        }

        Ok(Self {
            values,
            subscriptions,
        })
    }

    pub fn keys(&self) -> &[String] {
        self.values.keys()
    }

    pub fn get(&self, key: &str) -> Result<Value> {
        Ok(self.values.get_value(&key.to_string())?)
    }

    pub fn subscribe<F>(&self, key: &str, callback: F) -> Result<Unsubscribe>
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        Ok(self.values.subscribe(&key.to_string(), callback)?)
    }

    /// Stop tracking the source state. Values freeze at their last state.
    pub fn dispose(&self) {
        self.subscriptions.iter().for_each(Unsubscribe::unsubscribe);
    }
}

impl fmt::Debug for UniDirectionalInterface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UniDirectionalInterface")
            .field("keys", &self.values.keys())
            .finish()
    }
}
