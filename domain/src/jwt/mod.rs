//! HS256 bearer tokens.
//!
//! Tokens are signed with the shared secret from `Config::jwt_secret` and
//! carry a numeric `user_id` claim.
//!
//! # Example
//!
//! ```rust
//! use domain::jwt::{encode_token, validate_token};
//! use std::time::Duration;
//!
//! let token = encode_token(42, "secret", Duration::from_secs(60)).unwrap();
//! assert_eq!(validate_token(&token, "secret").unwrap().user_id, 42);
//! ```

use crate::error::Error;
use crate::Id;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use log::*;
use std::time::Duration;

pub use claims::Claims;

mod claims;

/// Signs a token for `user_id` that expires after `ttl`.
pub fn encode_token(user_id: Id, secret: &str, ttl: Duration) -> Result<String, Error> {
    let exp = chrono::Utc::now().timestamp() as u64 + ttl.as_secs();
    let claims = Claims {
        user_id,
        exp: exp as usize,
    };

    Ok(encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?)
}

/// Checks the signature and expiry of `token`. Any failure is `Unauthenticated`.
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, Error> {
    let validation = Validation::new(Algorithm::HS256);

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| {
        debug!("Rejected bearer token: {e}");
        Error {
            source: Some(Box::new(e)),
            ..Error::unauthenticated()
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AccessErrorKind, DomainErrorKind};

    #[test]
    fn token_round_trips_the_user_id() {
        let token = encode_token(7, "secret", Duration::from_secs(300)).unwrap();

        let claims = validate_token(&token, "secret").unwrap();

        assert_eq!(claims.user_id, 7);
    }

    #[test]
    fn token_signed_with_another_secret_is_unauthenticated() {
        let token = encode_token(7, "secret", Duration::from_secs(300)).unwrap();

        let err = validate_token(&token, "other-secret").unwrap_err();

        assert_eq!(
            err.error_kind,
            DomainErrorKind::Access(AccessErrorKind::Unauthenticated)
        );
    }

    #[test]
    fn expired_token_is_unauthenticated() {
        let claims = Claims {
            user_id: 7,
            exp: 1_000_000,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"secret"),
        )
        .unwrap();

        assert!(validate_token(&token, "secret").is_err());
    }

    #[test]
    fn garbage_is_unauthenticated() {
        assert!(validate_token("not-a-jwt", "secret").is_err());
    }
}
