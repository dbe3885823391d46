use anyhow::Result;
use log::{info, warn};
use std::path::PathBuf;
use std::sync::Arc;

use pulseguard::api::rest::{AppState, RestApi};
use pulseguard::config;
use pulseguard::db::{seed, DatabaseService};
use pulseguard::messaging::EventBus;
use pulseguard::notifier;
use pulseguard::security::auth::AuthService;

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = config::load_config(config_path.as_deref())?;

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(&config.api.log_level),
    )
    .init();

    info!("Starting PulseGuard incident backend");
    info!("Configuration loaded");

    // Create database connection pool, run migrations
    let db = DatabaseService::new(&config.database).await?;
    let db_pool = Arc::clone(&db.pool);

    // Seed devices from the legacy fixture if the store is empty
    if let Err(e) = seed::seed_devices(&db_pool, &config.seed.devices_fixture).await {
        warn!("Device seeding failed: {}", e);
    }

    // Broadcast channel shared by every mutation handler and every
    // connected event-feed client
    let bus = Arc::new(EventBus::new(config.broadcast.capacity));

    // Create auth service
    let auth_service = Arc::new(AuthService::new(Arc::clone(&db_pool), &config.security));

    // Escalation notification sink, if configured
    let notifier = notifier::create_notifier(&config.notifier);

    let state = AppState {
        db_pool,
        bus,
        auth_service,
        notifier,
    };

    // Start the REST API; blocks until the shutdown signal
    let http_server = RestApi::new(&config.api, state)?;
    http_server.run().await?;

    info!("Shutting down");

    Ok(())
}
