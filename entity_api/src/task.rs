use super::error::Error;
use super::Database;
use chrono::Utc;
use entity::tasks::Model;
use entity::Id;
use log::*;

/// Stores a new task on `board_id`. New tasks always start in `todo`.
pub async fn create(db: &Database, board_id: Id, task_model: Model) -> Result<Model, Error> {
    debug!("New Task Model to be inserted: {task_model:?}");

    if !db.boards().rows.contains_key(&board_id) {
        return Err(Error::not_found(format!("board {board_id}")));
    }

    let title = validate_title(&task_model.title)?;
    let now = Utc::now();
    let task = Model {
        id: db.tasks().next_id(),
        title,
        description: task_model.description,
        status: Default::default(),
        priority: task_model.priority,
        board_id,
        assignee_id: task_model.assignee_id,
        due_date: task_model.due_date,
        created_at: now,
        updated_at: now,
    };

    db.tasks().rows.insert(task.id, task.clone());

    Ok(task)
}

/// Replaces every client-editable field, including status. The task stays on its board.
pub async fn update(db: &Database, id: Id, model: Model) -> Result<Model, Error> {
    let title = validate_title(&model.title)?;

    match db.tasks().rows.get_mut(&id) {
        Some(mut task) => {
            debug!("Existing Task model to be Updated: {:?}", *task);

            task.title = title;
            task.description = model.description;
            task.status = model.status;
            task.priority = model.priority;
            task.assignee_id = model.assignee_id;
            task.due_date = model.due_date;
            task.updated_at = Utc::now();

            Ok(task.clone())
        }
        None => {
            error!("Task with id {id} not found");
            Err(Error::not_found(format!("task {id}")))
        }
    }
}

pub async fn find_by_id(db: &Database, id: Id) -> Result<Model, Error> {
    db.tasks()
        .rows
        .get(&id)
        .map(|task| task.clone())
        .ok_or_else(|| Error::not_found(format!("task {id}")))
}

/// Tasks on `board_id`, oldest first.
pub async fn find_by_board_id(db: &Database, board_id: Id) -> Result<Vec<Model>, Error> {
    let mut tasks: Vec<Model> = db
        .tasks()
        .rows
        .iter()
        .filter(|task| task.board_id == board_id)
        .map(|task| task.clone())
        .collect();
    tasks.sort_by_key(|task| task.id);

    Ok(tasks)
}

/// Returns the removed task.
pub async fn delete_by_id(db: &Database, id: Id) -> Result<Model, Error> {
    db.tasks()
        .rows
        .remove(&id)
        .map(|(_, task)| task)
        .ok_or_else(|| Error::not_found(format!("task {id}")))
}

fn validate_title(title: &str) -> Result<String, Error> {
    let title = title.trim();
    if title.is_empty() {
        return Err(Error::validation("task title must not be empty"));
    }
    Ok(title.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board;
    use crate::error::EntityApiErrorKind;
    use entity::{boards, priority::Priority, status::Status};

    async fn new_board(db: &Database) -> boards::Model {
        let now = Utc::now();
        board::create(
            db,
            boards::Model {
                id: 0,
                title: "Board".to_string(),
                description: String::new(),
                owner_id: 0,
                created_at: now,
                updated_at: now,
            },
            1,
        )
        .await
        .unwrap()
    }

    fn task(title: &str, status: Status, priority: Priority) -> Model {
        let now = Utc::now();
        Model {
            id: 0,
            title: title.to_string(),
            description: String::new(),
            status,
            priority,
            board_id: 0,
            assignee_id: None,
            due_date: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn create_starts_in_todo_whatever_status_was_sent() {
        let db = Database::new();
        let board = new_board(&db).await;

        let created = create(&db, board.id, task("Ship", Status::Done, Priority::High))
            .await
            .unwrap();

        assert_eq!(created.status, Status::Todo);
        assert_eq!(created.priority, Priority::High);
        assert_eq!(created.board_id, board.id);
    }

    #[tokio::test]
    async fn create_on_missing_board_is_not_found() {
        let db = Database::new();

        let result = create(&db, 9, task("Orphan", Status::Todo, Priority::Low)).await;

        assert_eq!(
            result.unwrap_err().error_kind,
            EntityApiErrorKind::RecordNotFound
        );
    }

    #[tokio::test]
    async fn update_changes_status_but_not_board() {
        let db = Database::new();
        let board = new_board(&db).await;
        let created = create(&db, board.id, task("Ship", Status::Todo, Priority::Medium))
            .await
            .unwrap();

        let mut changes = task("Ship it", Status::InProgress, Priority::Low);
        changes.board_id = 1234;
        let updated = update(&db, created.id, changes).await.unwrap();

        assert_eq!(updated.title, "Ship it");
        assert_eq!(updated.status, Status::InProgress);
        assert_eq!(updated.board_id, board.id);
        assert_eq!(find_by_id(&db, created.id).await.unwrap(), updated);
    }

    #[tokio::test]
    async fn find_by_board_id_lists_tasks_in_creation_order() {
        let db = Database::new();
        let board = new_board(&db).await;
        for title in ["one", "two", "three"] {
            create(&db, board.id, task(title, Status::Todo, Priority::Medium))
                .await
                .unwrap();
        }

        let titles: Vec<_> = find_by_board_id(&db, board.id)
            .await
            .unwrap()
            .into_iter()
            .map(|task| task.title)
            .collect();

        assert_eq!(titles, vec!["one", "two", "three"]);
    }

    #[tokio::test]
    async fn delete_returns_the_removed_task() {
        let db = Database::new();
        let board = new_board(&db).await;
        let created = create(&db, board.id, task("Gone", Status::Todo, Priority::Medium))
            .await
            .unwrap();

        assert_eq!(delete_by_id(&db, created.id).await.unwrap(), created);
        assert!(find_by_id(&db, created.id).await.is_err());
    }
}
