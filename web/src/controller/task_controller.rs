use crate::controller::ApiResponse;
use crate::extractors::resolved_identity::ResolvedIdentity;
use crate::{AppState, Error};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use domain::task as TaskApi;
use domain::{tasks::Model, Id};
use serde_json::json;

use log::*;

/// GET all tasks on a board owned by the caller
pub async fn index(
    ResolvedIdentity(identity): ResolvedIdentity,
    State(app_state): State<AppState>,
    Path(board_id): Path<Id>,
) -> Result<impl IntoResponse, Error> {
    debug!("GET all Tasks for Board {board_id}");

    let tasks =
        TaskApi::find_by_board(app_state.db_conn_ref(), board_id, identity.user_id()).await?;

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), tasks)))
}

/// POST create a new Task on a board owned by the caller. New tasks start in `todo`.
pub async fn create(
    ResolvedIdentity(identity): ResolvedIdentity,
    State(app_state): State<AppState>,
    Path(board_id): Path<Id>,
    Json(task_model): Json<Model>,
) -> Result<impl IntoResponse, Error> {
    debug!("POST Create a New Task on Board {board_id} from: {task_model:?}");

    let task = TaskApi::create(
        app_state.db_conn_ref(),
        app_state.event_publisher.as_ref(),
        board_id,
        task_model,
        identity.user_id(),
    )
    .await?;

    debug!("New Task: {task:?}");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(StatusCode::CREATED.into(), task)),
    ))
}

pub async fn read(
    ResolvedIdentity(identity): ResolvedIdentity,
    State(app_state): State<AppState>,
    Path(id): Path<Id>,
) -> Result<impl IntoResponse, Error> {
    debug!("GET Task by id: {id}");

    let task = TaskApi::find_by_id(app_state.db_conn_ref(), id, identity.user_id()).await?;

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), task)))
}

/// PUT replace a Task. Omitted status and priority fall back to `todo` and `medium`.
pub async fn update(
    ResolvedIdentity(identity): ResolvedIdentity,
    State(app_state): State<AppState>,
    Path(id): Path<Id>,
    Json(task_model): Json<Model>,
) -> Result<impl IntoResponse, Error> {
    debug!("PUT Update Task with id: {id}");

    let task = TaskApi::update(
        app_state.db_conn_ref(),
        app_state.event_publisher.as_ref(),
        id,
        task_model,
        identity.user_id(),
    )
    .await?;

    debug!("Updated Task: {task:?}");

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), task)))
}

pub async fn delete(
    ResolvedIdentity(identity): ResolvedIdentity,
    State(app_state): State<AppState>,
    Path(id): Path<Id>,
) -> Result<impl IntoResponse, Error> {
    debug!("DELETE Task by id: {id}");

    TaskApi::delete(
        app_state.db_conn_ref(),
        app_state.event_publisher.as_ref(),
        id,
        identity.user_id(),
    )
    .await?;

    Ok(Json(json!({"id": id})))
}

#[cfg(test)]
mod tests {
    use crate::router::define_routes;
    use crate::test_support::{app_state, bearer, send};
    use crate::ANONYMOUS_USER_ID_HEADER;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn board(app: &axum::Router, authorization: &str) -> i64 {
        let (_, created) = send(
            app,
            "POST",
            "/api/v1/boards",
            Some(authorization),
            Some(json!({"title": "Sprint"})),
        )
        .await;
        created["data"]["id"].as_i64().unwrap()
    }

    #[tokio::test]
    async fn status_change_is_broadcast_as_status_changed() {
        let state = app_state();
        let app = define_routes(state.clone());
        let owner = bearer(1);
        let board_id = board(&app, &owner).await;
        let connection = state.hub.attach("observer".to_string());

        let (status, created) = send(
            &app,
            "POST",
            &format!("/api/v1/tasks/board/{board_id}"),
            Some(&owner),
            Some(json!({"title": "Ship", "priority": "high"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["data"]["status"], "todo");
        let id = created["data"]["id"].as_i64().unwrap();

        send(
            &app,
            "PUT",
            &format!("/api/v1/tasks/{id}"),
            Some(&owner),
            Some(json!({"title": "Ship", "status": "done", "priority": "high"})),
        )
        .await;
        send(
            &app,
            "PUT",
            &format!("/api/v1/tasks/{id}"),
            Some(&owner),
            Some(json!({"title": "Ship it", "status": "done"})),
        )
        .await;
        send(&app, "DELETE", &format!("/api/v1/tasks/{id}"), Some(&owner), None).await;

        state.hub.stats().await.unwrap();
        let events: Vec<Value> = connection
            .outbox()
            .drain()
            .iter()
            .map(|frame| serde_json::from_str(frame.as_str()).unwrap())
            .collect();
        let kinds: Vec<&str> = events
            .iter()
            .map(|event| event["type"].as_str().unwrap())
            .collect();
        assert_eq!(
            kinds,
            vec!["task-created", "status-changed", "task-updated", "task-deleted"]
        );
        assert_eq!(events[1]["payload"]["status"], "done");
        assert_eq!(events[2]["payload"]["priority"], "medium");
        assert_eq!(events[3]["payload"], json!({"id": id, "board_id": board_id}));
        assert!(events.iter().all(|event| event["board_id"] == board_id));
    }

    #[tokio::test]
    async fn anonymous_users_own_their_boards_and_tasks() {
        let app = define_routes(app_state());
        let anonymous_id = "5d7e9f1a-3b5c-4d7e-9f1a-3b5c7d9e1f2a";

        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/boards")
            .header(ANONYMOUS_USER_ID_HEADER, anonymous_id)
            .header("content-type", "application/json")
            .body(Body::from(json!({"title": "Guest board"}).to_string()))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let request = Request::builder()
            .uri("/api/v1/boards")
            .header(ANONYMOUS_USER_ID_HEADER, anonymous_id)
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["data"][0]["title"], "Guest board");
    }

    #[tokio::test]
    async fn tasks_on_someone_elses_board_are_forbidden() {
        let state = app_state();
        let app = define_routes(state.clone());
        let board_id = board(&app, &bearer(1)).await;
        let connection = state.hub.attach("observer".to_string());

        let (status, _) = send(
            &app,
            "POST",
            &format!("/api/v1/tasks/board/{board_id}"),
            Some(&bearer(2)),
            Some(json!({"title": "Intrusion"})),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = send(
            &app,
            "GET",
            &format!("/api/v1/tasks/board/{board_id}"),
            Some(&bearer(2)),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        state.hub.stats().await.unwrap();
        assert!(connection.outbox().is_empty());
    }
}
