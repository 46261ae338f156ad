use super::error::Error;
use super::Database;
use chrono::Utc;
use entity::boards::Model;
use entity::Id;
use log::*;

pub async fn create(db: &Database, board_model: Model, owner_id: Id) -> Result<Model, Error> {
    debug!("New Board Model to be inserted: {board_model:?}");

    let title = validate_title(&board_model.title)?;
    let now = Utc::now();
    let board = Model {
        id: db.boards().next_id(),
        title,
        description: board_model.description,
        owner_id,
        created_at: now,
        updated_at: now,
    };

    db.boards().rows.insert(board.id, board.clone());

    Ok(board)
}

/// Replaces the title and description. Owner and timestamps other than
/// `updated_at` are kept.
pub async fn update(db: &Database, id: Id, model: Model) -> Result<Model, Error> {
    let title = validate_title(&model.title)?;

    match db.boards().rows.get_mut(&id) {
        Some(mut board) => {
            debug!("Existing Board model to be Updated: {:?}", *board);

            board.title = title;
            board.description = model.description;
            board.updated_at = Utc::now();

            Ok(board.clone())
        }
        None => {
            error!("Board with id {id} not found");
            Err(Error::not_found(format!("board {id}")))
        }
    }
}

pub async fn find_by_id(db: &Database, id: Id) -> Result<Model, Error> {
    db.boards()
        .rows
        .get(&id)
        .map(|board| board.clone())
        .ok_or_else(|| Error::not_found(format!("board {id}")))
}

/// Boards owned by `owner_id`, oldest first.
pub async fn find_by_owner(db: &Database, owner_id: Id) -> Result<Vec<Model>, Error> {
    let mut boards: Vec<Model> = db
        .boards()
        .rows
        .iter()
        .filter(|board| board.owner_id == owner_id)
        .map(|board| board.clone())
        .collect();
    boards.sort_by_key(|board| board.id);

    Ok(boards)
}

/// Removes the board together with all of its tasks. Returns the removed board.
pub async fn delete_by_id(db: &Database, id: Id) -> Result<Model, Error> {
    let (_, board) = db
        .boards()
        .rows
        .remove(&id)
        .ok_or_else(|| Error::not_found(format!("board {id}")))?;

    db.tasks().rows.retain(|_, task| task.board_id != id);
    debug!("Deleted board {id} and its tasks");

    Ok(board)
}

fn validate_title(title: &str) -> Result<String, Error> {
    let title = title.trim();
    if title.is_empty() {
        return Err(Error::validation("board title must not be empty"));
    }
    Ok(title.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EntityApiErrorKind;
    use crate::task;
    use entity::tasks;

    fn board(title: &str) -> Model {
        let now = Utc::now();
        Model {
            id: 0,
            title: title.to_string(),
            description: "Sprint work".to_string(),
            owner_id: 0,
            created_at: now,
            updated_at: now,
        }
    }

    fn new_task(title: &str) -> tasks::Model {
        let now = Utc::now();
        tasks::Model {
            id: 0,
            title: title.to_string(),
            description: String::new(),
            status: Default::default(),
            priority: Default::default(),
            board_id: 0,
            assignee_id: None,
            due_date: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn create_assigns_sequential_ids_and_the_owner() {
        let db = Database::new();

        let first = create(&db, board("Roadmap"), 7).await.unwrap();
        let second = create(&db, board("Backlog"), 7).await.unwrap();

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(first.owner_id, 7);
        assert_eq!(find_by_id(&db, 1).await.unwrap(), first);
    }

    #[tokio::test]
    async fn create_rejects_a_blank_title() {
        let db = Database::new();

        let result = create(&db, board("   "), 1).await;

        assert_eq!(
            result.unwrap_err().error_kind,
            EntityApiErrorKind::ValidationError
        );
    }

    #[tokio::test]
    async fn find_by_owner_only_returns_that_owners_boards() {
        let db = Database::new();
        create(&db, board("Mine"), 1).await.unwrap();
        create(&db, board("Theirs"), 2).await.unwrap();
        create(&db, board("Also mine"), 1).await.unwrap();

        let titles: Vec<_> = find_by_owner(&db, 1)
            .await
            .unwrap()
            .into_iter()
            .map(|board| board.title)
            .collect();

        assert_eq!(titles, vec!["Mine", "Also mine"]);
    }

    #[tokio::test]
    async fn update_keeps_owner_and_creation_time() {
        let db = Database::new();
        let created = create(&db, board("Roadmap"), 3).await.unwrap();

        let updated = update(&db, created.id, board("Roadmap 2025")).await.unwrap();

        assert_eq!(updated.title, "Roadmap 2025");
        assert_eq!(updated.owner_id, 3);
        assert_eq!(updated.created_at, created.created_at);
    }

    #[tokio::test]
    async fn update_of_missing_board_is_not_found() {
        let db = Database::new();

        let result = update(&db, 42, board("Nope")).await;

        assert_eq!(
            result.unwrap_err().error_kind,
            EntityApiErrorKind::RecordNotFound
        );
    }

    #[tokio::test]
    async fn delete_removes_the_boards_tasks() {
        let db = Database::new();
        let doomed = create(&db, board("Doomed"), 1).await.unwrap();
        let kept = create(&db, board("Kept"), 1).await.unwrap();
        task::create(&db, doomed.id, new_task("a")).await.unwrap();
        let survivor = task::create(&db, kept.id, new_task("b")).await.unwrap();

        delete_by_id(&db, doomed.id).await.unwrap();

        assert!(find_by_id(&db, doomed.id).await.is_err());
        assert!(task::find_by_board_id(&db, doomed.id).await.unwrap().is_empty());
        assert_eq!(task::find_by_id(&db, survivor.id).await.unwrap(), survivor);
        assert_eq!(
            delete_by_id(&db, doomed.id).await.unwrap_err().error_kind,
            EntityApiErrorKind::RecordNotFound
        );
    }
}
