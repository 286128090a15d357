use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::kernel::constants;
use crate::kernel::error::Result;
use crate::storage::error::StorageSystemError;

/// Supported configuration file formats
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConfigFormat {
    /// JSON format (.json)
    Json,
    /// YAML format (.yaml, .yml) - requires "yaml-config" feature
    #[cfg(feature = "yaml-config")]
    Yaml,
    /// TOML format (.toml) - requires "toml-config" feature
    #[cfg(feature = "toml-config")]
    Toml,
}

impl ConfigFormat {
    /// Get the file extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            ConfigFormat::Json => "json",
            #[cfg(feature = "yaml-config")]
            ConfigFormat::Yaml => "yaml",
            #[cfg(feature = "toml-config")]
            ConfigFormat::Toml => "toml",
        }
    }

    /// Determine format from file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| match ext.to_lowercase().as_str() {
                "json" => Some(ConfigFormat::Json),
                #[cfg(feature = "yaml-config")]
                "yaml" | "yml" => Some(ConfigFormat::Yaml),
                #[cfg(feature = "toml-config")]
                "toml" => Some(ConfigFormat::Toml),
                _ => None,
            })
    }

    pub fn serialize<T: Serialize>(&self, value: &T) -> Result<String> {
        let text = match self {
            ConfigFormat::Json => serde_json::to_string_pretty(value)
                .map_err(|e| StorageSystemError::serialization("json", e))?,
            #[cfg(feature = "yaml-config")]
            ConfigFormat::Yaml => serde_yaml::to_string(value)
                .map_err(|e| StorageSystemError::serialization("yaml", e))?,
            #[cfg(feature = "toml-config")]
            ConfigFormat::Toml => toml::to_string_pretty(value)
                .map_err(|e| StorageSystemError::serialization("toml", e))?,
        };
        Ok(text)
    }

    pub fn deserialize<T: DeserializeOwned>(&self, data: &str) -> Result<T> {
        let value = match self {
            ConfigFormat::Json => serde_json::from_str(data)
                .map_err(|e| StorageSystemError::deserialization("json", e))?,
            #[cfg(feature = "yaml-config")]
            ConfigFormat::Yaml => serde_yaml::from_str(data)
                .map_err(|e| StorageSystemError::deserialization("yaml", e))?,
            #[cfg(feature = "toml-config")]
            ConfigFormat::Toml => toml::from_str(data)
                .map_err(|e| StorageSystemError::deserialization("toml", e))?,
        };
        Ok(value)
    }
}

/// Tuning for the sortable list drag engine and its auto-scroller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DragConfig {
    /// Pointer travel before an armed press becomes a drag
    pub threshold_px: f64,
    /// Height fraction of the TOP and BOTTOM bands on plain items
    pub item_edge_fraction: f64,
    /// Height fraction of the TOP and BOTTOM bands on groups
    pub group_edge_fraction: f64,
    /// Upper bound for the group bands
    pub group_edge_cap_px: f64,
    pub scroll_band_px: f64,
    pub scroll_step_px: f64,
    pub scroll_initial_delay_ms: u64,
    pub scroll_min_delay_ms: u64,
    /// Factor applied to the delay after every scroll step
    pub scroll_acceleration: f64,
}

impl Default for DragConfig {
    fn default() -> Self {
        Self {
            threshold_px: constants::DRAG_THRESHOLD_PX,
            item_edge_fraction: constants::ITEM_EDGE_FRACTION,
            group_edge_fraction: constants::GROUP_EDGE_FRACTION,
            group_edge_cap_px: constants::GROUP_EDGE_CAP_PX,
            scroll_band_px: constants::SCROLL_BAND_PX,
            scroll_step_px: constants::SCROLL_STEP_PX,
            scroll_initial_delay_ms: constants::SCROLL_INITIAL_DELAY_MS,
            scroll_min_delay_ms: constants::SCROLL_MIN_DELAY_MS,
            scroll_acceleration: constants::SCROLL_ACCELERATION,
        }
    }
}

/// Host configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkbenchConfig {
    /// Where the key-value store keeps its files
    pub data_dir: PathBuf,
    /// Log filter used when `RUST_LOG` is unset
    pub log_level: String,
    /// Whether GUI state keys flagged `persist` are written through
    pub persist_gui_state: bool,
    pub drag: DragConfig,
}

impl Default for WorkbenchConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(constants::DEFAULT_DATA_DIR),
            log_level: constants::DEFAULT_LOG_LEVEL.to_string(),
            persist_gui_state: true,
            drag: DragConfig::default(),
        }
    }
}

impl WorkbenchConfig {
    /// Load from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let format = ConfigFormat::from_path(path).ok_or_else(|| {
            StorageSystemError::UnsupportedConfigFormat(path.display().to_string())
        })?;
        let data = match fs::read_to_string(path) {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::debug!("No config at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(e) => return Err(StorageSystemError::io(e, "read_config", path.to_path_buf()).into()),
        };
        format.deserialize(&data)
    }

    /// Write to `path` in the format its extension names, replacing the file atomically.
    pub fn save(&self, path: &Path) -> Result<()> {
        let format = ConfigFormat::from_path(path).ok_or_else(|| {
            StorageSystemError::UnsupportedConfigFormat(path.display().to_string())
        })?;
        let text = format.serialize(self)?;

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)
            .map_err(|e| StorageSystemError::io(e, "create_dir_all", dir.clone()))?;
        let mut temp_file = NamedTempFile::new_in(&dir)
            .map_err(|e| StorageSystemError::io(e, "create_temp_file", dir.clone()))?;
        temp_file
            .write_all(text.as_bytes())
            .map_err(|e| StorageSystemError::io(e, "write_to_temp_file", temp_file.path().to_path_buf()))?;
        temp_file
            .persist(path)
            .map_err(|e| StorageSystemError::io(e.error, "persist_temp_file", path.to_path_buf()))?;
        Ok(())
    }
}
