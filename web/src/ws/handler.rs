use crate::extractors::resolved_identity::ResolvedIdentity;
use crate::AppState;
use axum::extract::ws::WebSocketUpgrade;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use futures::StreamExt;
use log::*;

/// Upgrades to a WebSocket once the identity gate has resolved the caller and
/// hands the socket to the hub. Inbound application frames are ignored; the
/// connection only receives board and task events.
pub(crate) async fn ws_handler(
    ResolvedIdentity(identity): ResolvedIdentity,
    State(app_state): State<AppState>,
    ws: WebSocketUpgrade,
) -> Response {
    if app_state.hub.is_shutting_down() {
        return (StatusCode::SERVICE_UNAVAILABLE, "SHUTTING DOWN").into_response();
    }

    debug!(
        "Establishing WebSocket connection for user {} (anonymous: {})",
        identity.user_id(),
        identity.is_anonymous()
    );

    let hub = app_state.hub.clone();
    let user_id = identity.user_id();

    ws.on_failed_upgrade(move |e| warn!("WebSocket upgrade failed for user {user_id}: {e}"))
        .on_upgrade(move |socket| async move {
            let (sink, stream) = socket.split();
            let connection_id = hub.register(user_id.to_string(), sink, stream);
            debug!("WebSocket connection {connection_id} handed to hub for user {user_id}");
        })
}
