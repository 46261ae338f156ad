//! In-memory storage for boards, tasks and users.
//!
//! Every operation takes a [`Database`] handle, which is cheap to clone and
//! safe to share between request handlers. Ids are assigned from a
//! per-table sequence starting at 1, so `0` never names a stored record.

use dashmap::DashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

pub use entity::{boards, priority, status, tasks, users, Id};

pub mod board;
pub mod error;
pub mod task;
pub mod user;

#[derive(Clone, Default)]
pub struct Database {
    tables: Arc<Tables>,
}

#[derive(Default)]
struct Tables {
    boards: Table<boards::Model>,
    tasks: Table<tasks::Model>,
    users: Table<users::Model>,
    // Unique index over users.email
    user_emails: DashMap<String, Id>,
}

struct Table<M> {
    rows: DashMap<Id, M>,
    sequence: AtomicI64,
}

impl<M> Default for Table<M> {
    fn default() -> Self {
        Self {
            rows: DashMap::new(),
            sequence: AtomicI64::new(0),
        }
    }
}

impl<M> Table<M> {
    fn next_id(&self) -> Id {
        self.sequence.fetch_add(1, Ordering::Relaxed) + 1
    }
}

impl Database {
    pub fn new() -> Self {
        Self::default()
    }

    fn boards(&self) -> &Table<boards::Model> {
        &self.tables.boards
    }

    fn tasks(&self) -> &Table<tasks::Model> {
        &self.tables.tasks
    }

    fn users(&self) -> &Table<users::Model> {
        &self.tables.users
    }

    fn user_emails(&self) -> &DashMap<String, Id> {
        &self.tables.user_emails
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("boards", &self.tables.boards.rows.len())
            .field("tasks", &self.tables.tasks.rows.len())
            .field("users", &self.tables.users.rows.len())
            .finish()
    }
}
