use events::EventPublisher;
use hub::{Hub, HubConfig, HubDomainEventHandler};
use log::*;
use service::config::Config;
use service::logging::Logger;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    let config = Config::new();
    if let Err(e) = Logger::init_logger(&config) {
        eprintln!("Failed to initialize logger: {e}");
    }

    info!("Starting up task board [{}]...", config.runtime_env());

    if config.is_default_jwt_secret() {
        if config.is_production() {
            error!("JWT_SECRET must be set in production");
            std::process::exit(1);
        }
        warn!("Using the development JWT secret; set JWT_SECRET before deploying");
    }

    let hub = Hub::start(hub_config(&config));

    // The hub receives every committed board and task mutation
    let event_publisher =
        EventPublisher::new().with_handler(Arc::new(HubDomainEventHandler::new(hub.clone())));

    let shutdown_timeout = config.shutdown_timeout();
    let app_state = web::AppState::new(
        config,
        domain::Database::new(),
        hub.clone(),
        event_publisher,
    );

    let shutdown_signal = {
        let hub = hub.clone();
        async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for the shutdown signal: {e}");
                // Without a signal there is nothing to wait for; keep serving.
                std::future::pending::<()>().await;
            }
            info!("Shutdown signal received");
            if !hub.shutdown(shutdown_timeout).await {
                warn!("Some WebSocket connections did not close within {shutdown_timeout:?}");
            }
        }
    };

    if let Err(e) = web::init_server(app_state, shutdown_signal).await {
        error!("Server failed: {e}");
        std::process::exit(1);
    }

    info!("Server stopped");
}

fn hub_config(config: &Config) -> HubConfig {
    HubConfig {
        outbox_capacity: config.outbox_capacity(),
        submission_capacity: config.submission_capacity(),
        write_timeout: config.write_timeout(),
        idle_timeout: config.idle_timeout(),
        ping_interval: config.ping_interval(),
    }
}
