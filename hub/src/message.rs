use axum::extract::ws::Utf8Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

pub type BoardId = i64;

/// The kind of mutation an [`Event`] reports. Serialized as the envelope's `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    #[serde(rename = "board-created")]
    BoardCreated,
    #[serde(rename = "board-updated")]
    BoardUpdated,
    #[serde(rename = "board-deleted")]
    BoardDeleted,
    #[serde(rename = "task-created")]
    TaskCreated,
    #[serde(rename = "task-updated")]
    TaskUpdated,
    #[serde(rename = "task-deleted")]
    TaskDeleted,
    #[serde(rename = "status-changed")]
    StatusChanged,
    /// Any `type` this build does not know about. Readers keep going when they
    /// see one; the hub refuses to send one.
    #[serde(other, skip_serializing)]
    Unknown,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::BoardCreated => "board-created",
            EventKind::BoardUpdated => "board-updated",
            EventKind::BoardDeleted => "board-deleted",
            EventKind::TaskCreated => "task-created",
            EventKind::TaskUpdated => "task-updated",
            EventKind::TaskDeleted => "task-deleted",
            EventKind::StatusChanged => "status-changed",
            EventKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Wire envelope for a completed mutation:
/// `{type, payload, board_id, timestamp}` with an RFC 3339 timestamp.
///
/// An `Event` is never changed after construction. The hub serializes it once
/// and hands the same text frame to every connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub payload: Value,
    pub board_id: BoardId,
    pub timestamp: DateTime<Utc>,
}

impl Event {
    /// Stamps the event with the current time.
    pub fn new(kind: EventKind, board_id: BoardId, payload: Value) -> Self {
        Self {
            kind,
            payload,
            board_id,
            timestamp: Utc::now(),
        }
    }

    /// Events without a payload, without a real board or of an unknown kind are never delivered.
    pub fn is_well_formed(&self) -> bool {
        self.kind != EventKind::Unknown && !self.payload.is_null() && self.board_id > 0
    }

    /// Serializes the envelope into the text frame written to every connection.
    pub fn to_frame(&self) -> Result<Utf8Bytes, serde_json::Error> {
        serde_json::to_string(self).map(Utf8Bytes::from)
    }
}
