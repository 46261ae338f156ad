use crate::message::{Event, EventKind};
use crate::Hub;
use async_trait::async_trait;
use events::{DomainEvent, EventHandler};
use log::*;
use serde_json::json;

/// Turns completed board and task mutations into hub broadcasts.
///
/// Every event goes to every live connection; clients filter by `board_id`.
pub struct HubDomainEventHandler {
    hub: Hub,
}

impl HubDomainEventHandler {
    pub fn new(hub: Hub) -> Self {
        Self { hub }
    }
}

/// Envelope for a domain event. Deletions carry the removed ids as their payload.
pub fn to_hub_event(event: &DomainEvent) -> Event {
    let board_id = event.board_id();

    let (kind, payload) = match event {
        DomainEvent::BoardCreated { board, .. } => (EventKind::BoardCreated, board.clone()),
        DomainEvent::BoardUpdated { board, .. } => (EventKind::BoardUpdated, board.clone()),
        DomainEvent::BoardDeleted { board_id } => {
            (EventKind::BoardDeleted, json!({ "id": board_id }))
        }
        DomainEvent::TaskCreated { task, .. } => (EventKind::TaskCreated, task.clone()),
        DomainEvent::TaskUpdated { task, .. } => (EventKind::TaskUpdated, task.clone()),
        DomainEvent::TaskDeleted { board_id, task_id } => (
            EventKind::TaskDeleted,
            json!({ "id": task_id, "board_id": board_id }),
        ),
        DomainEvent::TaskStatusChanged { task, .. } => (EventKind::StatusChanged, task.clone()),
    };

    Event::new(kind, board_id, payload)
}

#[async_trait]
impl EventHandler for HubDomainEventHandler {
    async fn handle(&self, event: &DomainEvent) {
        if let DomainEvent::TaskStatusChanged {
            previous_status, ..
        } = event
        {
            debug!(
                "Task on board {} moved out of status {previous_status}",
                event.board_id()
            );
        }

        let hub_event = to_hub_event(event);
        debug!(
            "Broadcasting {} for board {}",
            hub_event.kind, hub_event.board_id
        );
        self.hub.broadcast(hub_event);
    }
}
