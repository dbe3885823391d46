use crate::messaging::event::{EventMessage, EventType};
use log::warn;
use serde::Serialize;
use tokio::sync::broadcast;

/// Default buffer capacity per subscriber.
const DEFAULT_CAPACITY: usize = 256;

/// In-process fan-out bus scoped to one server process.
///
/// Every successful mutation publishes one event; every currently connected
/// subscriber receives every event. There is no replay: a subscriber that
/// joins after a publish never sees it, and a slow subscriber drops its
/// oldest buffered events and observes `RecvError::Lagged`.
pub struct EventBus {
    sender: broadcast::Sender<EventMessage>,
}

impl EventBus {
    /// Create a bus with a specific per-subscriber buffer capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers. Fire-and-forget: with
    /// zero subscribers the event is dropped silently.
    pub fn publish(&self, event: EventMessage) {
        let _ = self.sender.send(event);
    }

    /// Serialize a shaped record and publish it under the given event kind.
    /// A record that fails to serialize is logged and dropped; the mutation
    /// it describes has already been persisted.
    pub fn publish_record<T: Serialize>(&self, event: EventType, record: &T) {
        match EventMessage::new(event, record) {
            Ok(message) => self.publish(message),
            Err(e) => warn!("Failed to encode {} event: {}", event, e),
        }
    }

    /// Subscribe to all events published on this bus.
    pub fn subscribe(&self) -> broadcast::Receiver<EventMessage> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
