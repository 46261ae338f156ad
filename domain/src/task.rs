use crate::error::Error;
use crate::tasks::Model;
use crate::{board, payload, Database, Id};
use entity_api::task;
use events::{DomainEvent, EventPublisher};
use log::*;

/// Tasks on a board the caller owns.
pub async fn find_by_board(db: &Database, board_id: Id, user_id: Id) -> Result<Vec<Model>, Error> {
    board::find_by_id(db, board_id, user_id).await?;

    Ok(task::find_by_board_id(db, board_id).await?)
}

/// Finds a task whose board the caller owns.
pub async fn find_by_id(db: &Database, id: Id, user_id: Id) -> Result<Model, Error> {
    let task = task::find_by_id(db, id).await?;
    board::find_by_id(db, task.board_id, user_id).await?;

    Ok(task)
}

pub async fn create(
    db: &Database,
    event_publisher: &EventPublisher,
    board_id: Id,
    task_model: Model,
    user_id: Id,
) -> Result<Model, Error> {
    board::find_by_id(db, board_id, user_id).await?;

    let task = task::create(db, board_id, task_model).await?;

    event_publisher
        .publish(DomainEvent::TaskCreated {
            board_id,
            task: payload(&task),
        })
        .await;

    Ok(task)
}

/// Replaces the task's editable fields. Publishes `TaskStatusChanged` when the
/// status moved, `TaskUpdated` otherwise.
pub async fn update(
    db: &Database,
    event_publisher: &EventPublisher,
    id: Id,
    task_model: Model,
    user_id: Id,
) -> Result<Model, Error> {
    let existing = find_by_id(db, id, user_id).await?;

    let task = task::update(db, id, task_model).await?;

    let event = if task.status != existing.status {
        debug!(
            "Task {id} status changed from {} to {}",
            existing.status, task.status
        );
        DomainEvent::TaskStatusChanged {
            board_id: task.board_id,
            task: payload(&task),
            previous_status: existing.status.to_string(),
        }
    } else {
        DomainEvent::TaskUpdated {
            board_id: task.board_id,
            task: payload(&task),
        }
    };
    event_publisher.publish(event).await;

    Ok(task)
}

pub async fn delete(
    db: &Database,
    event_publisher: &EventPublisher,
    id: Id,
    user_id: Id,
) -> Result<(), Error> {
    find_by_id(db, id, user_id).await?;

    let task = task::delete_by_id(db, id).await?;

    event_publisher
        .publish(DomainEvent::TaskDeleted {
            board_id: task.board_id,
            task_id: task.id,
        })
        .await;

    Ok(())
}
