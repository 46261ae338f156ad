//! Business operations for the task board.
//!
//! Every mutating operation writes through `entity_api` first and only then
//! publishes a [`events::DomainEvent`]. A failed write never produces an event.

// Re-exports from `entity` crate via `entity_api`
pub use entity_api::{boards, priority, status, tasks, users, Database, Id};

// Re-exported so the web layer can wire handlers without depending on `events` directly
pub use events;

pub mod board;
pub mod error;
pub mod identity;
pub mod jwt;
pub mod task;
pub mod user;

/// Public JSON representation of a model, as carried in event payloads.
/// A model that cannot be represented yields `Null`, which the hub refuses to deliver.
pub(crate) fn payload<T: serde::Serialize>(model: &T) -> serde_json::Value {
    serde_json::to_value(model).unwrap_or_else(|e| {
        log::warn!("Failed to serialize event payload: {e}");
        serde_json::Value::Null
    })
}

#[cfg(test)]
pub(crate) mod test_support {
    use async_trait::async_trait;
    use events::{DomainEvent, EventHandler, EventPublisher};
    use std::sync::Arc;
    use tokio::sync::Mutex;

    /// Remembers every event it is handed.
    #[derive(Default)]
    pub(crate) struct Recorder {
        events: Mutex<Vec<DomainEvent>>,
    }

    impl Recorder {
        pub(crate) async fn events(&self) -> Vec<DomainEvent> {
            self.events.lock().await.clone()
        }
    }

    #[async_trait]
    impl EventHandler for Recorder {
        async fn handle(&self, event: &DomainEvent) {
            self.events.lock().await.push(event.clone());
        }
    }

    pub(crate) fn recording_publisher() -> (EventPublisher, Arc<Recorder>) {
        let recorder = Arc::new(Recorder::default());
        let publisher = EventPublisher::new().with_handler(recorder.clone());
        (publisher, recorder)
    }
}
