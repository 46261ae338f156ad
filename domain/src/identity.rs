//! Resolves who is making a request.
//!
//! A valid bearer token wins. A missing or invalid token falls back to the
//! anonymous id, provisioning a guest user on first sight. With neither, the
//! request is unauthenticated and must be refused before any state is touched.

use crate::error::Error;
use crate::{jwt, user, Database, Id};
use log::*;
use service::config::Config;

/// What the caller presented. Empty strings count as absent.
#[derive(Debug, Clone, Copy, Default)]
pub struct Credentials<'a> {
    pub bearer_token: Option<&'a str>,
    pub anonymous_id: Option<&'a str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Identity {
    Authenticated { user_id: Id },
    Anonymous { user_id: Id },
}

impl Identity {
    pub fn user_id(&self) -> Id {
        match self {
            Identity::Authenticated { user_id } | Identity::Anonymous { user_id } => *user_id,
        }
    }

    pub fn is_anonymous(&self) -> bool {
        matches!(self, Identity::Anonymous { .. })
    }
}

/// Returns an `Unauthenticated` error when no identity can be resolved.
pub async fn resolve(
    db: &Database,
    config: &Config,
    credentials: Credentials<'_>,
) -> Result<Identity, Error> {
    let bearer_token = credentials.bearer_token.filter(|t| !t.trim().is_empty());
    let anonymous_id = credentials.anonymous_id.filter(|a| !a.trim().is_empty());

    if let Some(token) = bearer_token {
        match jwt::validate_token(token.trim(), config.jwt_secret()) {
            Ok(claims) => {
                return Ok(Identity::Authenticated {
                    user_id: claims.user_id,
                })
            }
            Err(_) if anonymous_id.is_some() => {
                debug!("Invalid bearer token, falling back to anonymous id");
            }
            Err(e) => return Err(e),
        }
    }

    match anonymous_id {
        Some(anonymous_id) => {
            let guest = user::find_or_create_anonymous(db, anonymous_id).await?;
            Ok(Identity::Anonymous { user_id: guest.id })
        }
        None => {
            debug!("Request carried neither a bearer token nor an anonymous id");
            Err(Error::unauthenticated())
        }
    }
}
