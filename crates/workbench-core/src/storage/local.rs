use std::fmt;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::kernel::error::Result;
use crate::storage::error::StorageSystemError;
use crate::storage::provider::KeyValueStore;

/// Key-value store keeping one `<key>.json` file per key under a base directory
pub struct LocalKeyValueStore {
    base_path: PathBuf,
}

impl LocalKeyValueStore {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn resolve_path(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && !key.starts_with('.')
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'));
        if !valid {
            return Err(StorageSystemError::InvalidKey {
                key: key.to_string(),
                reason: "keys may only contain ASCII letters, digits, '.', '-' and '_'".to_string(),
            }
            .into());
        }
        Ok(self.base_path.join(format!("{key}.json")))
    }
}

impl KeyValueStore for LocalKeyValueStore {
    fn name(&self) -> &str {
        "local"
    }

    fn get(&self, key: &str) -> Result<Option<String>> {
        let full_path = self.resolve_path(key)?;
        match fs::read_to_string(&full_path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageSystemError::io(e, "read_to_string", full_path).into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let full_path = self.resolve_path(key)?;
        fs::create_dir_all(&self.base_path)
            .map_err(|e| StorageSystemError::io(e, "create_dir_all", self.base_path.clone()))?;

        // Write to a sibling temp file, then atomically replace the target
        let mut temp_file = NamedTempFile::new_in(&self.base_path)
            .map_err(|e| StorageSystemError::io(e, "create_temp_file", self.base_path.clone()))?;
        temp_file
            .write_all(value.as_bytes())
            .map_err(|e| StorageSystemError::io(e, "write_to_temp_file", temp_file.path().to_path_buf()))?;
        temp_file
            .persist(&full_path)
            .map_err(|e| StorageSystemError::io(e.error, "persist_temp_file", full_path.clone()))?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let full_path = self.resolve_path(key)?;
        match fs::remove_file(&full_path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageSystemError::io(e, "remove_file", full_path).into()),
        }
    }
}

impl fmt::Debug for LocalKeyValueStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalKeyValueStore")
            .field("base_path", &self.base_path)
            .finish()
    }
}
