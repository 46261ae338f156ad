use crate::controller::{board_controller, health_check_controller, task_controller};
use crate::ws::handler::ws_handler;
use crate::AppState;
use axum::{routing::get, Router};

/// Every route lives under `/api/v1`.
pub fn define_routes(app_state: AppState) -> Router {
    Router::new().nest(
        "/api/v1",
        Router::new()
            .merge(health_routes(app_state.clone()))
            .merge(board_routes(app_state.clone()))
            .merge(task_routes(app_state.clone()))
            .merge(ws_routes(app_state)),
    )
}

fn health_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check_controller::health_check))
        .with_state(app_state)
}

fn board_routes(app_state: AppState) -> Router {
    Router::new()
        .route(
            "/boards",
            get(board_controller::index).post(board_controller::create),
        )
        .route(
            "/boards/{id}",
            get(board_controller::read)
                .put(board_controller::update)
                .delete(board_controller::delete),
        )
        .with_state(app_state)
}

fn task_routes(app_state: AppState) -> Router {
    Router::new()
        .route(
            "/tasks/board/{board_id}",
            get(task_controller::index).post(task_controller::create),
        )
        .route(
            "/tasks/{id}",
            get(task_controller::read)
                .put(task_controller::update)
                .delete(task_controller::delete),
        )
        .with_state(app_state)
}

fn ws_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .with_state(app_state)
}
