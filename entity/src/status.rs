use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a task sits on the board.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    #[default]
    Todo,
    InProgress,
    Done,
}

impl fmt::Display for Status {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Todo => write!(fmt, "todo"),
            Status::InProgress => write!(fmt, "in_progress"),
            Status::Done => write!(fmt, "done"),
        }
    }
}
