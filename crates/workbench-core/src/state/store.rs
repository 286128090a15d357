use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::event::Unsubscribe;
use crate::state::error::StateStoreError;
use crate::utils::lock;

/// Per-key behaviour flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StateKeyOptions {
    /// Suppress notifications when the new value equals the old one.
    pub deep_compare: bool,
    /// Mirror the value into the key-value store.
    pub persist: bool,
}

impl StateKeyOptions {
    pub fn deep_compare() -> Self {
        Self {
            deep_compare: true,
            persist: false,
        }
    }

    pub fn persisted() -> Self {
        Self {
            deep_compare: true,
            persist: true,
        }
    }
}

/// One entry of a store schema.
#[derive(Debug, Clone)]
pub struct StateKeySpec<K, V> {
    pub key: K,
    pub default: V,
    pub options: StateKeyOptions,
}

impl<K, V> StateKeySpec<K, V> {
    pub fn new(key: K, default: V) -> Self {
        Self {
            key,
            default,
            options: StateKeyOptions::default(),
        }
    }

    pub fn with_options(mut self, options: StateKeyOptions) -> Self {
        self.options = options;
        self
    }
}

struct Slot<V> {
    value: Arc<V>,
    options: StateKeyOptions,
}

type ValueCallback<V> = Arc<dyn Fn(&V) + Send + Sync>;
type SubscriberTable<K, V> = HashMap<K, BTreeMap<u64, ValueCallback<V>>>;

/// Observable store over a fixed key set.
///
/// Subscribers of a key are called synchronously, in subscription order,
/// after the store lock has been released.
pub struct StateStore<K, V> {
    keys: Vec<K>,
    slots: Mutex<HashMap<K, Slot<V>>>,
    subscribers: Arc<Mutex<SubscriberTable<K, V>>>,
    next_subscriber_id: AtomicU64,
}

impl<K, V> StateStore<K, V>
where
    K: Clone + Eq + Hash + fmt::Debug + Send + Sync + 'static,
    V: PartialEq + Send + Sync + 'static,
{
    pub fn new(schema: impl IntoIterator<Item = StateKeySpec<K, V>>) -> Self {
        let mut keys = Vec::new();
        let mut slots = HashMap::new();
        for spec in schema {
            if !slots.contains_key(&spec.key) {
                keys.push(spec.key.clone());
            }
            slots.insert(
                spec.key,
                Slot {
                    value: Arc::new(spec.default),
                    options: spec.options,
                },
            );
        }
        Self {
            keys,
            slots: Mutex::new(slots),
            subscribers: Arc::new(Mutex::new(HashMap::new())),
            next_subscriber_id: AtomicU64::new(1),
        }
    }

    /// Declared keys in schema order.
    pub fn keys(&self) -> &[K] {
        &self.keys
    }

    pub fn contains_key(&self, key: &K) -> bool {
        lock(&self.slots).contains_key(key)
    }

    pub fn options(&self, key: &K) -> Result<StateKeyOptions, StateStoreError> {
        lock(&self.slots)
            .get(key)
            .map(|slot| slot.options)
            .ok_or_else(|| StateStoreError::unknown_key(key))
    }

    /// Keys declared with `persist`.
    pub fn persisted_keys(&self) -> Vec<K> {
        let slots = lock(&self.slots);
        self.keys
            .iter()
            .filter(|key| slots.get(*key).is_some_and(|slot| slot.options.persist))
            .cloned()
            .collect()
    }

    pub fn get_shared_value(&self, key: &K) -> Result<Arc<V>, StateStoreError> {
        lock(&self.slots)
            .get(key)
            .map(|slot| slot.value.clone())
            .ok_or_else(|| StateStoreError::unknown_key(key))
    }

    pub fn get_value(&self, key: &K) -> Result<V, StateStoreError>
    where
        V: Clone,
    {
        self.get_shared_value(key).map(|value| V::clone(&value))
    }

    /// Store `value` under `key`. Returns whether subscribers were notified.
    pub fn set_value(&self, key: &K, value: V) -> Result<bool, StateStoreError> {
        self.set_shared_value(key, Arc::new(value))
    }

    /// Like [`StateStore::set_value`], but an `Arc` already held by the store
    /// is recognised as "no change" without comparing contents.
    pub fn set_shared_value(&self, key: &K, value: Arc<V>) -> Result<bool, StateStoreError> {
        {
            let mut slots = lock(&self.slots);
            let slot = slots
                .get_mut(key)
                .ok_or_else(|| StateStoreError::unknown_key(key))?;
            if Arc::ptr_eq(&slot.value, &value) {
                return Ok(false);
            }
            if slot.options.deep_compare && *slot.value == *value {
                return Ok(false);
            }
            slot.value = value.clone();
        }

        let callbacks: Vec<ValueCallback<V>> = lock(&self.subscribers)
            .get(key)
            .map(|listeners| listeners.values().cloned().collect())
            .unwrap_or_default();
        for callback in callbacks {
            callback(&value);
        }
        Ok(true)
    }

    /// Subscribe to `key`. The callback runs once right away with the current
    /// value and then after every change.
    pub fn subscribe<F>(&self, key: &K, callback: F) -> Result<Unsubscribe, StateStoreError>
    where
        F: Fn(&V) + Send + Sync + 'static,
    {
        let current = self.get_shared_value(key)?;
        let callback: ValueCallback<V> = Arc::new(callback);
        let id = self.next_subscriber_id.fetch_add(1, Ordering::SeqCst);
        lock(&self.subscribers)
            .entry(key.clone())
            .or_default()
            .insert(id, callback.clone());

        callback(&current);

        let table = Arc::downgrade(&self.subscribers);
        let key = key.clone();
        Ok(Unsubscribe::new(move || {
            let Some(table) = table.upgrade() else {
                return;
            };
            let mut table = lock(&table);
            if let Some(listeners) = table.get_mut(&key) {
                listeners.remove(&id);
                if listeners.is_empty() {
                    table.remove(&key);
                }
            }
        }))
    }

    pub fn subscriber_count(&self, key: &K) -> usize {
        lock(&self.subscribers).get(key).map_or(0, BTreeMap::len)
    }
}

impl<K> StateStore<K, Value>
where
    K: Clone + Eq + Hash + fmt::Debug + Send + Sync + 'static,
{
    /// Read a JSON-valued key into a typed value.
    pub fn get_as<T: DeserializeOwned>(&self, key: &K) -> Result<T, StateStoreError> {
        let value = self.get_shared_value(key)?;
        T::deserialize(&*value).map_err(|source| StateStoreError::TypeMismatch {
            key: format!("{key:?}"),
            source,
        })
    }

    pub fn set_as<T: Serialize>(&self, key: &K, value: &T) -> Result<bool, StateStoreError> {
        let value = serde_json::to_value(value).map_err(|source| StateStoreError::TypeMismatch {
            key: format!("{key:?}"),
            source,
        })?;
        self.set_value(key, value)
    }
}

impl StateStore<String, Value> {
    /// All keys and their current values as one JSON object.
    pub fn to_json_object(&self) -> serde_json::Map<String, Value> {
        let slots = lock(&self.slots);
        self.keys
            .iter()
            .filter_map(|key| {
                slots
                    .get(key)
                    .map(|slot| (key.clone(), Value::clone(&slot.value)))
            })
            .collect()
    }
}

impl<K, V> fmt::Debug for StateStore<K, V>
where
    K: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateStore")
            .field("keys", &self.keys)
            .finish_non_exhaustive()
    }
}
