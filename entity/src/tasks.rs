//! A unit of work on a board.

use crate::{priority::Priority, status::Status, Id};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Model {
    #[serde(skip_deserializing)]
    pub id: Id,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: Status,
    #[serde(default)]
    pub priority: Priority,
    #[serde(skip_deserializing)]
    pub board_id: Id,
    pub assignee_id: Option<Id>,
    pub due_date: Option<DateTime<Utc>>,
    #[serde(skip_deserializing, default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(skip_deserializing, default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn omitted_status_and_priority_take_their_defaults() {
        let task: Model = serde_json::from_value(json!({
            "title": "Plan sprint",
            "assignee_id": null,
            "due_date": null
        }))
        .unwrap();

        assert_eq!(task.status, Status::Todo);
        assert_eq!(task.priority, Priority::Medium);
        assert_eq!(task.description, "");
    }

    #[test]
    fn client_cannot_choose_ids() {
        let task: Model = serde_json::from_value(json!({
            "id": 99,
            "board_id": 42,
            "title": "Sneaky",
            "assignee_id": null,
            "due_date": null
        }))
        .unwrap();

        assert_eq!(task.id, 0);
        assert_eq!(task.board_id, 0);
    }
}
