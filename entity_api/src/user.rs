use super::error::{EntityApiErrorKind, Error};
use super::Database;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use entity::users::Model;
use entity::Id;
use log::*;

/// Stores a new user. Emails are unique.
pub async fn create(db: &Database, user_model: Model) -> Result<Model, Error> {
    debug!("New User Model to be inserted: {user_model:?}");

    match db.user_emails().entry(user_model.email.clone()) {
        Entry::Occupied(_) => Err(Error {
            detail: Some(format!("email {} is already registered", user_model.email)),
            error_kind: EntityApiErrorKind::RecordNotUnique,
        }),
        Entry::Vacant(slot) => {
            let user = insert(db, user_model);
            slot.insert(user.id);
            Ok(user)
        }
    }
}

/// Returns the user registered under `user_model.email`, storing `user_model`
/// first if there is none. Concurrent callers with the same email all get the
/// same user.
pub async fn find_or_create_by_email(db: &Database, user_model: Model) -> Result<Model, Error> {
    let id = match db.user_emails().entry(user_model.email.clone()) {
        Entry::Occupied(existing) => *existing.get(),
        Entry::Vacant(slot) => {
            let user = insert(db, user_model);
            info!("Provisioned user {} ({})", user.id, user.email);
            slot.insert(user.id);
            return Ok(user);
        }
    };

    find_by_id(db, id).await
}

pub async fn find_by_id(db: &Database, id: Id) -> Result<Model, Error> {
    db.users()
        .rows
        .get(&id)
        .map(|user| user.clone())
        .ok_or_else(|| Error::not_found(format!("user {id}")))
}

pub async fn find_by_email(db: &Database, email: &str) -> Result<Option<Model>, Error> {
    match db.user_emails().get(email).map(|id| *id) {
        Some(id) => Ok(Some(find_by_id(db, id).await?)),
        None => Ok(None),
    }
}

fn insert(db: &Database, user_model: Model) -> Model {
    let now = Utc::now();
    let user = Model {
        id: db.users().next_id(),
        created_at: now,
        updated_at: now,
        ..user_model
    };
    db.users().rows.insert(user.id, user.clone());
    user
}
