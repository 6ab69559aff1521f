//! EventHub API server
//!
//! Main application entry point

use anyhow::Context;
use tracing::info;

use eventhub::{
    config::Settings,
    database::{create_pool, run_migrations, DatabaseService, PoolOptions},
    handlers::AppState,
    services::ServiceFactory,
    utils::logging,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; the environment may already be set.
    dotenv::dotenv().ok();

    // Load configuration
    let settings = Settings::new().context("loading configuration")?;
    settings.validate().context("validating configuration")?;

    // Initialize logging; the guard flushes the log file on exit
    let _log_guard = logging::init_logging(&settings.logging).context("initializing logging")?;

    info!("Starting {}...", eventhub::info());

    info!("Connecting to database...");
    let db_pool = create_pool(&PoolOptions::from(&settings.database))
        .await
        .context("connecting to database")?;
    run_migrations(&db_pool).await.context("running migrations")?;
    let database_service = DatabaseService::new(db_pool);

    info!("Connecting to Redis...");
    let redis_client = redis::Client::open(settings.redis.url.as_str()).context("opening Redis client")?;

    info!("Initializing services...");
    let services = ServiceFactory::new(&settings, database_service.clone(), redis_client);
    let state = AppState::new(settings, database_service, services);

    eventhub::server::serve(state).await.context("serving HTTP")?;

    info!("EventHub has been shut down.");
    Ok(())
}
