use axum::http::{header, HeaderName, HeaderValue, Method};
use domain::events::EventPublisher;
use domain::Database;
use hub::Hub;
use log::*;
use service::config::Config;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

mod controller;
mod error;
pub(crate) mod extractors;
pub mod router;
pub(crate) mod ws;

pub use self::error::{Error, Result};

/// Header carrying the client-generated id of an anonymous user.
pub const ANONYMOUS_USER_ID_HEADER: &str = "x-anonymous-user-id";

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub database: Database,
    pub hub: Hub,
    pub event_publisher: Arc<EventPublisher>,
}

impl AppState {
    pub fn new(
        config: Config,
        database: Database,
        hub: Hub,
        event_publisher: EventPublisher,
    ) -> Self {
        Self {
            config,
            database,
            hub,
            event_publisher: Arc::new(event_publisher),
        }
    }

    pub fn db_conn_ref(&self) -> &Database {
        &self.database
    }
}

/// Serves the API until `shutdown_signal` resolves, then stops accepting new
/// connections and waits for in-flight requests.
pub async fn init_server<F>(app_state: AppState, shutdown_signal: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let host = app_state.config.interface.as_deref().unwrap_or("127.0.0.1");
    let server_url = format!("{host}:{}", app_state.config.port);

    let cors_layer = cors_layer(&app_state.config);
    let router = router::define_routes(app_state).layer(cors_layer);

    let listener = TcpListener::bind(&server_url).await?;
    info!("Server starting... listening for connections on http://{server_url}");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal)
        .await
}

fn cors_layer(config: &Config) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Ignoring invalid CORS origin {origin}: {e}");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_credentials(true)
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            HeaderName::from_static(ANONYMOUS_USER_ID_HEADER),
        ])
        .allow_origin(origins)
}
