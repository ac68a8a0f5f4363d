//! Server mode
//!
//! Configures and starts the HTTP server with all routes.

use actix_web::{
    App, HttpServer,
    middleware::{Compress, DefaultHeaders},
    web,
};
use anyhow::Result;
use tracing::warn;

use crate::api::cors::{build_cors_middleware, validate_cors_origins};
use crate::api::middleware::{RequestIdMiddleware, TimingMiddleware};
use crate::runtime::lifetime;

/// Upper bound of actix workers
const MAX_WORKERS: usize = 32;

/// Run the HTTP server
///
/// `host`/`port` override the configured bind address.
///
/// **Note**: Logging system must be initialized before calling this function
pub async fn run_server(host: Option<String>, port: Option<u16>) -> Result<()> {
    let startup = lifetime::startup::prepare_server_startup()
        .await
        .map_err(|e| {
            tracing::error!("Server startup failed: {}", e);
            e
        })?;

    let storage = startup.storage.clone();
    let article_service = startup.article_service.clone();
    let summary_service = startup.summary_service.clone();
    let adk_client = startup.adk_client.clone();
    let app_start_time = startup.app_start_time.clone();

    let config = crate::config::get_config();
    let host = host.unwrap_or_else(|| config.server.host.clone());
    let port = port.unwrap_or(config.server.port);

    let cpu_count = config.server.cpu_count.clamp(1, MAX_WORKERS);
    warn!("Using {} CPU cores for the server", cpu_count);

    let cors_origins = config.server.cors_allowed_origins.clone();
    validate_cors_origins(&cors_origins);

    let storage_for_shutdown = storage.clone();

    let server = HttpServer::new(move || {
        App::new()
            .wrap(TimingMiddleware)
            .wrap(RequestIdMiddleware)
            .wrap(build_cors_middleware(&cors_origins))
            .wrap(Compress::default())
            .app_data(web::Data::new(storage.clone()))
            .app_data(web::Data::new(article_service.clone()))
            .app_data(web::Data::new(summary_service.clone()))
            .app_data(web::Data::new(adk_client.clone()))
            .app_data(web::Data::new(app_start_time.clone()))
            .app_data(web::PayloadConfig::new(1024 * 1024))
            .wrap(DefaultHeaders::new().add(("Cache-Control", "no-cache, no-store, must-revalidate")))
            .configure(crate::api::configure)
    })
    .keep_alive(std::time::Duration::from_secs(30))
    .workers(cpu_count);

    let bind_address = format!("{}:{}", host, port);
    warn!("Starting server at http://{}", bind_address);
    let server = server.bind(&bind_address)?.run();

    tokio::select! {
        res = server => {
            res?;
        }
        _ = lifetime::shutdown::listen_for_shutdown(storage_for_shutdown) => {
            warn!("Graceful shutdown: all tasks completed");
        }
    }

    Ok(())
}
