//! Broadcast publisher for lifecycle events.
//!
//! ```rust
//! use batch_core::events::EventPublisher;
//! use serde_json::json;
//!
//! # tokio_test::block_on(async {
//! let publisher = EventPublisher::new(16);
//! let mut receiver = publisher.subscribe();
//!
//! assert_eq!(publisher.publish("export.archived", json!({"files": 3})), 1);
//!
//! let event = receiver.recv().await.unwrap();
//! assert_eq!(event.name, "export.archived");
//! # });
//! ```

use super::dispatcher::EventDispatcher;
use super::types::BatchEvent;
use crate::constants::defaults;
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Broadcasting publisher for lifecycle events.
///
/// Every dispatched [`BatchEvent`] is turned into an owned [`PublishedEvent`] carrying a JSON
/// snapshot of the execution, so subscribers can live on other tasks.
#[derive(Debug, Clone)]
pub struct EventPublisher {
    sender: broadcast::Sender<PublishedEvent>,
}

/// Event that has been published
#[derive(Debug, Clone)]
pub struct PublishedEvent {
    pub name: String,
    pub context: Value,
    pub published_at: chrono::DateTime<chrono::Utc>,
}

impl EventPublisher {
    /// Create a new event publisher with the specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publish an event with the given name and context, returning how many subscribers got it
    pub fn publish(&self, event_name: impl Into<String>, context: Value) -> usize {
        self.send(event_name.into(), context)
    }

    fn send(&self, name: String, context: Value) -> usize {
        let event = PublishedEvent {
            name,
            context,
            published_at: chrono::Utc::now(),
        };

        // No subscribers is acceptable: events are published even if no one is listening
        match self.sender.send(event) {
            Ok(receivers) => receivers,
            Err(_) => {
                debug!("Event published without subscribers");
                0
            }
        }
    }

    /// Subscribe to events
    pub fn subscribe(&self) -> broadcast::Receiver<PublishedEvent> {
        self.sender.subscribe()
    }

    /// Get the number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl EventDispatcher for EventPublisher {
    fn dispatch(&self, event: &BatchEvent<'_>) {
        let context = match event.context() {
            Ok(context) => context,
            Err(err) => {
                warn!(event = event.name(), error = %err, "Failed to serialize event context");
                Value::Null
            }
        };

        debug!(event = event.name(), "Dispatching batch event");
        self.send(event.name().to_string(), context);
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new(defaults::EVENT_CHANNEL_CAPACITY)
    }
}
