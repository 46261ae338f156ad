use crate::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

/// GET liveness plus the number of live WebSocket connections.
/// Reports 503 once the hub has stopped.
pub async fn health_check(State(app_state): State<AppState>) -> impl IntoResponse {
    match app_state.hub.stats().await {
        Some(stats) => (
            StatusCode::OK,
            Json(json!({"status": "healthy", "connections": stats.connections})),
        ),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({"status": "shutting down", "connections": 0})),
        ),
    }
}
