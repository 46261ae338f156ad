use crate::error::Error;
use crate::users::Model;
use crate::{Database, Id};
use chrono::Utc;
use entity_api::user;
use log::*;
use uuid::Uuid;

const ANONYMOUS_EMAIL_DOMAIN: &str = "anonymous.local";

/// Returns the guest user behind a client-generated anonymous id, provisioning
/// it on first sight. The id must be a UUID; anything else is `Unauthenticated`.
pub async fn find_or_create_anonymous(db: &Database, anonymous_id: &str) -> Result<Model, Error> {
    let anonymous_id = Uuid::parse_str(anonymous_id.trim()).map_err(|e| {
        debug!("Rejected malformed anonymous id: {e}");
        Error::unauthenticated()
    })?;
    let anonymous_id = anonymous_id.hyphenated().to_string();

    let now = Utc::now();
    let guest = Model {
        id: 0,
        email: format!("{anonymous_id}@{ANONYMOUS_EMAIL_DOMAIN}"),
        username: format!("User_{}", &anonymous_id[..8]),
        first_name: "Anonymous".to_string(),
        last_name: "User".to_string(),
        created_at: now,
        updated_at: now,
    };

    Ok(user::find_or_create_by_email(db, guest).await?)
}

pub fn is_anonymous(user: &Model) -> bool {
    user.email.ends_with(&format!("@{ANONYMOUS_EMAIL_DOMAIN}"))
}

pub async fn find(db: &Database, id: Id) -> Result<Model, Error> {
    Ok(user::find_by_id(db, id).await?)
}
