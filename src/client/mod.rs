//! Client-side synchronization: the in-memory alert/device projection each
//! connected dashboard holds, and the reconciliation rules that keep a
//! just-submitted change from being clobbered by stale concurrent data.

pub mod cache;
#[cfg(test)]
mod tests;

pub use cache::{Actor, AlertCache, DeviceCache, PendingStatus, PendingToggle};

use crate::db::models::{Alert, Device};
use crate::messaging::{EventMessage, EventType};

/// A broadcast event decoded into the client's typed domain records.
#[derive(Debug, Clone)]
pub enum ClientEvent {
    NewAlert(Alert),
    UpdateAlert(Alert),
    DeviceUpdate(Device),
}

impl ClientEvent {
    /// Decode a wire frame from the event feed.
    pub fn from_message(message: &EventMessage) -> Result<Self, serde_json::Error> {
        Ok(match message.event {
            EventType::NewAlert => Self::NewAlert(serde_json::from_value(message.data.clone())?),
            EventType::UpdateAlert => {
                Self::UpdateAlert(serde_json::from_value(message.data.clone())?)
            }
            EventType::DeviceUpdate => {
                Self::DeviceUpdate(serde_json::from_value(message.data.clone())?)
            }
        })
    }
}
