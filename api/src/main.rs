use std::sync::Arc;
use std::time::Duration;

use actix_web::{web, HttpServer};
use anyhow::Context;
use sv_api::{create_app, state::build_state, telemetry::init_tracing};
use sv_core::services::polling::{PollingWorker, PollingWorkerConfig};
use sv_shared::AppConfig;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("Failed to load configuration")?;
    init_tracing(&config.logging)?;

    tracing::info!(
        environment = %config.environment,
        backend = ?config.database.backend,
        provider = ?config.provider.kind,
        "Starting SmsVerify API server"
    );

    let state = build_state(&config)
        .await
        .context("Failed to initialise application state")?;

    let worker = Arc::new(PollingWorker::new(
        Arc::clone(&state.lifecycle),
        PollingWorkerConfig::from(&config.lifecycle.polling),
    ));
    let poller = worker.start_background_task();

    let database = state.database.clone();
    let data = web::Data::new(state);
    let app_config = config.clone();

    let mut server = HttpServer::new(move || create_app(data.clone(), &app_config))
        .keep_alive(Duration::from_secs(config.server.keep_alive));
    if config.server.workers > 0 {
        server = server.workers(config.server.workers);
    }

    let bind_address = config.server.bind_address();
    tracing::info!(address = %bind_address, "Server listening");

    server
        .bind(&bind_address)
        .with_context(|| format!("Failed to bind {}", bind_address))?
        .run()
        .await
        .context("HTTP server terminated with an error")?;

    tracing::info!("Shutting down");
    if let Some(handle) = poller {
        handle.abort();
    }
    if let Some(database) = database {
        database.close().await;
    }

    Ok(())
}
