pub mod config;
pub mod error;
pub mod local;
pub mod memory;
pub mod provider;

/// Re-export key types
pub use config::{ConfigFormat, DragConfig, WorkbenchConfig};
pub use error::StorageSystemError;
pub use local::LocalKeyValueStore;
pub use memory::MemoryKeyValueStore;
pub use provider::{read_or_default, write_json, KeyValueStore, PersistedKey};
