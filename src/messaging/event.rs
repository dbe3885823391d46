use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Event kinds emitted on the broadcast channel, one per successful
/// mutation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum EventType {
    #[serde(rename = "new-alert")]
    NewAlert,
    #[serde(rename = "update-alert")]
    UpdateAlert,
    #[serde(rename = "device-update")]
    DeviceUpdate,
}

impl Display for EventType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NewAlert => write!(f, "new-alert"),
            Self::UpdateAlert => write!(f, "update-alert"),
            Self::DeviceUpdate => write!(f, "device-update"),
        }
    }
}

/// Event message structure. `data` always carries the full shaped record
/// produced by the mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMessage {
    /// Unique event ID
    pub id: Uuid,
    /// Event kind
    pub event: EventType,
    /// Event timestamp
    pub timestamp: chrono::DateTime<chrono::Utc>,
    /// Shaped post-mutation record
    pub data: serde_json::Value,
}

impl EventMessage {
    /// Create a new event message
    pub fn new<T: Serialize>(event: EventType, data: &T) -> Result<Self, serde_json::Error> {
        Ok(Self {
            id: Uuid::new_v4(),
            event,
            timestamp: chrono::Utc::now(),
            data: serde_json::to_value(data)?,
        })
    }
}
