//! Event system infrastructure for the task board.
//!
//! This crate provides the event system that decouples board/task mutations
//! from the real-time delivery layer (the WebSocket hub).
//!
//! # Architecture
//!
//! - **DomainEvent**: Enum representing every completed board or task mutation
//! - **EventHandler**: Trait for implementing event handlers
//! - **EventPublisher**: Publishes events to registered handlers
//!
//! This crate has no dependencies on internal crates (entity, domain, etc.),
//! avoiding circular dependencies. Entity data is carried as serialized JSON values.
//!
//! Events must only be published after the corresponding write has been
//! committed; a failed write never produces an event.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// A type alias that represents any Entity's internal id field data type.
/// This matches the definition in the entity crate to maintain compatibility.
pub type Id = i64;

/// Domain events that represent business-level changes in the system.
/// These events are emitted when domain operations complete successfully.
///
/// Entity data is carried as `serde_json::Value` (the entity's public
/// representation) to avoid dependencies on the entity crate.
#[derive(Debug, Clone, PartialEq)]
pub enum DomainEvent {
    /// Emitted after a new board has been stored.
    BoardCreated {
        board_id: Id,
        /// Complete serialized board entity.
        board: Value,
    },
    /// Emitted after a board's title or description changed.
    BoardUpdated { board_id: Id, board: Value },
    /// Emitted after a board and its tasks were removed.
    BoardDeleted { board_id: Id },
    /// Emitted after a new task has been stored on a board.
    TaskCreated {
        board_id: Id,
        /// Complete serialized task entity.
        task: Value,
    },
    /// Emitted after a task changed without its status changing.
    TaskUpdated { board_id: Id, task: Value },
    /// Emitted after a task was removed from a board.
    TaskDeleted { board_id: Id, task_id: Id },
    /// Emitted instead of `TaskUpdated` when an update moved the task to a new status.
    TaskStatusChanged {
        board_id: Id,
        task: Value,
        /// Status the task held before the update, e.g. `"todo"`.
        previous_status: String,
    },
}

impl DomainEvent {
    /// The board every event is scoped to.
    pub fn board_id(&self) -> Id {
        match self {
            DomainEvent::BoardCreated { board_id, .. }
            | DomainEvent::BoardUpdated { board_id, .. }
            | DomainEvent::BoardDeleted { board_id }
            | DomainEvent::TaskCreated { board_id, .. }
            | DomainEvent::TaskUpdated { board_id, .. }
            | DomainEvent::TaskDeleted { board_id, .. }
            | DomainEvent::TaskStatusChanged { board_id, .. } => *board_id,
        }
    }
}

/// Trait for handling domain events.
/// Implementations can perform side effects like sending notifications,
/// updating caches, logging, etc.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, event: &DomainEvent);
}

/// Publishes domain events to registered handlers.
/// Handlers are called sequentially in registration order.
#[derive(Clone)]
pub struct EventPublisher {
    handlers: Arc<Vec<Arc<dyn EventHandler>>>,
}

impl EventPublisher {
    pub fn new() -> Self {
        Self {
            handlers: Arc::new(Vec::new()),
        }
    }

    /// Register a new event handler.
    /// Note: This creates a new publisher instance with the additional handler.
    /// Store the returned publisher in your application state.
    pub fn with_handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
        let mut handlers = (*self.handlers).clone();
        handlers.push(handler);
        self.handlers = Arc::new(handlers);
        self
    }

    /// Publish an event to all registered handlers.
    /// Handlers are called sequentially and are expected not to fail; any
    /// error handling is the handler's own business.
    pub async fn publish(&self, event: DomainEvent) {
        for handler in self.handlers.iter() {
            handler.handle(&event).await;
        }
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new()
    }
}
