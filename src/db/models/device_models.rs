use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Connectivity status of a monitored device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum DeviceStatus {
    Online,
    Offline,
}

impl DeviceStatus {
    pub fn toggled(&self) -> Self {
        match self {
            Self::Online => Self::Offline,
            Self::Offline => Self::Online,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Online => "online",
            Self::Offline => "offline",
        }
    }
}

impl Display for DeviceStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Device record, identical in stored and shaped form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Device {
    pub id: String,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    pub status: DeviceStatus,
    #[serde(rename = "lastSeen")]
    pub last_seen: String,
}

/// Partial update payload for a device. `lastSeen` is never accepted from
/// the caller; it is stamped server-side on every update.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateDeviceRequest {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub name: Option<String>,
    pub status: Option<DeviceStatus>,
}

/// Legacy seed fixture: `{"devices": [...]}`.
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceFixture {
    #[serde(default)]
    pub devices: Vec<DeviceFixtureEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeviceFixtureEntry {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub name: Option<String>,
    pub status: Option<DeviceStatus>,
    #[serde(rename = "lastSeen")]
    pub last_seen: Option<String>,
}

impl DeviceFixtureEntry {
    pub fn into_device(self, fallback_last_seen: String) -> Device {
        Device {
            id: self.id,
            kind: self.kind.unwrap_or_else(|| "unknown".to_string()),
            name: self.name.unwrap_or_default(),
            status: self.status.unwrap_or(DeviceStatus::Offline),
            last_seen: self.last_seen.unwrap_or(fallback_last_seen),
        }
    }
}
