use crate::boards::Model;
use crate::error::Error;
use crate::{payload, Database, Id};
use entity_api::board;
use events::{DomainEvent, EventPublisher};
use log::*;

pub use entity_api::board::find_by_owner;

pub async fn create(
    db: &Database,
    event_publisher: &EventPublisher,
    board_model: Model,
    owner_id: Id,
) -> Result<Model, Error> {
    let board = board::create(db, board_model, owner_id).await?;

    event_publisher
        .publish(DomainEvent::BoardCreated {
            board_id: board.id,
            board: payload(&board),
        })
        .await;

    Ok(board)
}

/// Finds a board the caller owns. Boards owned by someone else are `Forbidden`.
pub async fn find_by_id(db: &Database, id: Id, user_id: Id) -> Result<Model, Error> {
    let board = board::find_by_id(db, id).await?;

    if board.owner_id != user_id {
        warn!("User {user_id} tried to access board {id} owned by {}", board.owner_id);
        return Err(Error::forbidden());
    }

    Ok(board)
}

pub async fn update(
    db: &Database,
    event_publisher: &EventPublisher,
    id: Id,
    board_model: Model,
    user_id: Id,
) -> Result<Model, Error> {
    find_by_id(db, id, user_id).await?;

    let board = board::update(db, id, board_model).await?;

    event_publisher
        .publish(DomainEvent::BoardUpdated {
            board_id: board.id,
            board: payload(&board),
        })
        .await;

    Ok(board)
}

pub async fn delete(
    db: &Database,
    event_publisher: &EventPublisher,
    id: Id,
    user_id: Id,
) -> Result<(), Error> {
    find_by_id(db, id, user_id).await?;

    board::delete_by_id(db, id).await?;

    event_publisher
        .publish(DomainEvent::BoardDeleted { board_id: id })
        .await;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AccessErrorKind, DomainErrorKind, EntityErrorKind, InternalErrorKind};
    use crate::test_support::recording_publisher;
    use chrono::Utc;

    fn board(title: &str) -> Model {
        let now = Utc::now();
        Model {
            id: 0,
            title: title.to_string(),
            description: String::new(),
            owner_id: 0,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn create_publishes_the_stored_board() {
        let db = Database::new();
        let (publisher, recorder) = recording_publisher();

        let created = create(&db, &publisher, board("Roadmap"), 5).await.unwrap();

        let events = recorder.events().await;
        assert_eq!(events.len(), 1);
        match &events[0] {
            DomainEvent::BoardCreated { board_id, board } => {
                assert_eq!(*board_id, created.id);
                assert_eq!(board["title"], "Roadmap");
                assert_eq!(board["owner_id"], 5);
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[tokio::test]
    async fn failed_create_publishes_nothing() {
        let db = Database::new();
        let (publisher, recorder) = recording_publisher();

        let err = create(&db, &publisher, board(""), 5).await.unwrap_err();

        assert_eq!(
            err.error_kind,
            DomainErrorKind::Internal(InternalErrorKind::Entity(EntityErrorKind::Invalid))
        );
        assert!(recorder.events().await.is_empty());
    }

    #[tokio::test]
    async fn only_the_owner_may_update() {
        let db = Database::new();
        let (publisher, recorder) = recording_publisher();
        let created = create(&db, &publisher, board("Roadmap"), 5).await.unwrap();

        let err = update(&db, &publisher, created.id, board("Hijacked"), 6)
            .await
            .unwrap_err();

        assert_eq!(
            err.error_kind,
            DomainErrorKind::Access(AccessErrorKind::Forbidden)
        );
        assert_eq!(find_by_id(&db, created.id, 5).await.unwrap().title, "Roadmap");
        assert_eq!(recorder.events().await.len(), 1);
    }

    #[tokio::test]
    async fn update_and_delete_publish_in_order() {
        let db = Database::new();
        let (publisher, recorder) = recording_publisher();
        let created = create(&db, &publisher, board("Roadmap"), 5).await.unwrap();

        update(&db, &publisher, created.id, board("Roadmap v2"), 5)
            .await
            .unwrap();
        delete(&db, &publisher, created.id, 5).await.unwrap();

        let events = recorder.events().await;
        assert!(matches!(events[1], DomainEvent::BoardUpdated { ref board, .. } if board["title"] == "Roadmap v2"));
        assert_eq!(
            events[2],
            DomainEvent::BoardDeleted {
                board_id: created.id
            }
        );
    }

    #[tokio::test]
    async fn deleting_a_missing_board_is_not_found() {
        let db = Database::new();
        let (publisher, recorder) = recording_publisher();

        let err = delete(&db, &publisher, 77, 1).await.unwrap_err();

        assert_eq!(
            err.error_kind,
            DomainErrorKind::Internal(InternalErrorKind::Entity(EntityErrorKind::NotFound))
        );
        assert!(recorder.events().await.is_empty());
    }
}
