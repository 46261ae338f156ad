//! A board groups tasks and belongs to exactly one owner.

use crate::Id;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Model {
    #[serde(skip_deserializing)]
    pub id: Id,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(skip_deserializing)]
    pub owner_id: Id,
    #[serde(skip_deserializing, default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(skip_deserializing, default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}
