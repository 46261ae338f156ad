use crate::controller::ApiResponse;
use crate::extractors::resolved_identity::ResolvedIdentity;
use crate::{AppState, Error};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use domain::board as BoardApi;
use domain::{boards::Model, Id};
use serde_json::json;

use log::*;

/// GET all boards owned by the caller
pub async fn index(
    ResolvedIdentity(identity): ResolvedIdentity,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, Error> {
    debug!("GET all Boards for user {}", identity.user_id());

    let boards = BoardApi::find_by_owner(app_state.db_conn_ref(), identity.user_id()).await?;

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), boards)))
}

/// POST create a new Board owned by the caller
pub async fn create(
    ResolvedIdentity(identity): ResolvedIdentity,
    State(app_state): State<AppState>,
    Json(board_model): Json<Model>,
) -> Result<impl IntoResponse, Error> {
    debug!("POST Create a New Board from: {board_model:?}");

    let board = BoardApi::create(
        app_state.db_conn_ref(),
        app_state.event_publisher.as_ref(),
        board_model,
        identity.user_id(),
    )
    .await?;

    debug!("New Board: {board:?}");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(StatusCode::CREATED.into(), board)),
    ))
}

/// GET a particular Board specified by its id.
pub async fn read(
    ResolvedIdentity(identity): ResolvedIdentity,
    State(app_state): State<AppState>,
    Path(id): Path<Id>,
) -> Result<impl IntoResponse, Error> {
    debug!("GET Board by id: {id}");

    let board = BoardApi::find_by_id(app_state.db_conn_ref(), id, identity.user_id()).await?;

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), board)))
}

pub async fn update(
    ResolvedIdentity(identity): ResolvedIdentity,
    State(app_state): State<AppState>,
    Path(id): Path<Id>,
    Json(board_model): Json<Model>,
) -> Result<impl IntoResponse, Error> {
    debug!("PUT Update Board with id: {id}");

    let board = BoardApi::update(
        app_state.db_conn_ref(),
        app_state.event_publisher.as_ref(),
        id,
        board_model,
        identity.user_id(),
    )
    .await?;

    debug!("Updated Board: {board:?}");

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), board)))
}

pub async fn delete(
    ResolvedIdentity(identity): ResolvedIdentity,
    State(app_state): State<AppState>,
    Path(id): Path<Id>,
) -> Result<impl IntoResponse, Error> {
    debug!("DELETE Board by id: {id}");

    BoardApi::delete(
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
    use axum::http::StatusCode;
    use serde_json::{json, Value};

    #[tokio::test]
    async fn board_lifecycle_is_broadcast_to_connections() {
        let state = app_state();
        let connection = state.hub.attach("observer".to_string());
        let app = define_routes(state.clone());
        let owner = bearer(1);

        let (status, created) = send(
            &app,
            "POST",
            "/api/v1/boards",
            Some(&owner),
            Some(json!({"title": "Roadmap", "description": "Q3"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let id = created["data"]["id"].as_i64().unwrap();

        let (status, _) = send(
            &app,
            "PUT",
            &format!("/api/v1/boards/{id}"),
            Some(&owner),
            Some(json!({"title": "Roadmap Q3"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) =
            send(&app, "DELETE", &format!("/api/v1/boards/{id}"), Some(&owner), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"id": id}));

        state.hub.stats().await.unwrap();
        let kinds: Vec<Value> = connection
            .outbox()
            .drain()
            .iter()
            .map(|frame| serde_json::from_str::<Value>(frame.as_str()).unwrap())
            .map(|event| {
                assert_eq!(event["board_id"], id);
                event["type"].clone()
            })
            .collect();
        assert_eq!(
            kinds,
            vec![
                json!("board-created"),
                json!("board-updated"),
                json!("board-deleted")
            ]
        );
    }

    #[tokio::test]
    async fn boards_are_private_to_their_owner() {
        let state = app_state();
        let app = define_routes(state);
        let (_, created) = send(
            &app,
            "POST",
            "/api/v1/boards",
            Some(&bearer(1)),
            Some(json!({"title": "Mine"})),
        )
        .await;
        let id = created["data"]["id"].as_i64().unwrap();

        let (status, _) =
            send(&app, "GET", &format!("/api/v1/boards/{id}"), Some(&bearer(2)), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) = send(&app, "GET", "/api/v1/boards", Some(&bearer(2)), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"], json!([]));
    }

    #[tokio::test]
    async fn missing_board_is_not_found_and_blank_title_is_unprocessable() {
        let app = define_routes(app_state());
        let owner = bearer(1);

        let (status, _) = send(&app, "GET", "/api/v1/boards/999", Some(&owner), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(
            &app,
            "POST",
            "/api/v1/boards",
            Some(&owner),
            Some(json!({"title": "  "})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn requests_without_identity_are_unauthorized() {
        let app = define_routes(app_state());

        let (status, _) = send(&app, "GET", "/api/v1/boards", None, None).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
