//! Claims carried by the bearer tokens this service accepts.

use crate::Id;
use serde::{Deserialize, Serialize};

/// `user_id` is the numeric id of the authenticated user. `exp` is seconds
/// since the Unix epoch and is always validated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: Id,
    pub exp: usize,
}
