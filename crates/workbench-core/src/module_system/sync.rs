use std::fmt;

use serde::{Deserialize, Serialize};

/// Setting categories a module instance can keep in sync with other instances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SyncSettingKey {
    Ensemble,
    Date,
    TimeSeries,
    Surface,
    CameraPosition,
    Wellbore,
}

impl SyncSettingKey {
    pub const ALL: [SyncSettingKey; 6] = [
        SyncSettingKey::Ensemble,
        SyncSettingKey::Date,
        SyncSettingKey::TimeSeries,
        SyncSettingKey::Surface,
        SyncSettingKey::CameraPosition,
        SyncSettingKey::Wellbore,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            SyncSettingKey::Ensemble => "Ensemble",
            SyncSettingKey::Date => "Date",
            SyncSettingKey::TimeSeries => "Time series",
            SyncSettingKey::Surface => "Surface",
            SyncSettingKey::CameraPosition => "Camera position",
            SyncSettingKey::Wellbore => "Wellbore",
        }
    }
}

impl fmt::Display for SyncSettingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
