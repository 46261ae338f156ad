use crate::{AppState, Error, ANONYMOUS_USER_ID_HEADER};
use axum::extract::{FromRequestParts, Query};
use axum::http::{header, request::Parts, HeaderMap};
use domain::identity::{self, Credentials, Identity};
use log::*;
use serde::Deserialize;

/// The caller's identity, resolved by the bearer-token-or-anonymous gate.
/// Rejects with 401 before the handler runs when no identity can be resolved.
pub(crate) struct ResolvedIdentity(pub Identity);

/// Browsers cannot set headers on a WebSocket handshake, so upgrade requests
/// may carry the same credentials as query parameters.
#[derive(Debug, Default, Deserialize)]
struct HandshakeParams {
    token: Option<String>,
    anonymous_id: Option<String>,
}

impl FromRequestParts<AppState> for ResolvedIdentity {
    type Rejection = Error;

    async fn from_request_parts(
        parts: &mut Parts,
        app_state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let params = if is_websocket_upgrade(&parts.headers) {
            Query::<HandshakeParams>::try_from_uri(&parts.uri)
                .map(|Query(params)| params)
                .unwrap_or_default()
        } else {
            HandshakeParams::default()
        };

        let bearer_token = bearer_token(&parts.headers).or(params.token.as_deref());
        let anonymous_id = parts
            .headers
            .get(ANONYMOUS_USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .or(params.anonymous_id.as_deref());

        let identity = identity::resolve(
            app_state.db_conn_ref(),
            &app_state.config,
            Credentials {
                bearer_token,
                anonymous_id,
            },
        )
        .await
        .inspect_err(|_| debug!("Refusing {} {}: no identity", parts.method, parts.uri.path()))?;

        trace!("Resolved identity {identity:?}");
        Ok(ResolvedIdentity(identity))
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
}

fn is_websocket_upgrade(headers: &HeaderMap) -> bool {
    headers
        .get(header::UPGRADE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.eq_ignore_ascii_case("websocket"))
}
