//! Postgres pool setup, migrations and the health check

use std::time::Duration;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::{info, warn};
use crate::config::DatabaseConfig;
use crate::utils::errors::EventHubError;

pub type DatabasePool = PgPool;

/// Pool tuning; connection limits come from settings, the rest is fixed
#[derive(Debug, Clone)]
pub struct PoolOptions {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: Duration,
    pub idle_timeout: Option<Duration>,
    pub max_lifetime: Option<Duration>,
    /// Startup attempts before giving up on an unreachable database
    pub connect_attempts: u32,
    pub retry_delay: Duration,
}

impl From<&DatabaseConfig> for PoolOptions {
    fn from(settings: &DatabaseConfig) -> Self {
        Self {
            url: settings.url.clone(),
            max_connections: settings.max_connections,
            min_connections: settings.min_connections,
            acquire_timeout: Duration::from_secs(30),
            idle_timeout: Some(Duration::from_secs(600)),
            max_lifetime: Some(Duration::from_secs(1800)),
            connect_attempts: 5,
            retry_delay: Duration::from_secs(2),
        }
    }
}

/// Connect, retrying while the database comes up
pub async fn create_pool(options: &PoolOptions) -> Result<DatabasePool, EventHubError> {
    let mut attempt = 1;
    loop {
        match connect(options).await {
            Ok(pool) => {
                info!(attempt, max_connections = options.max_connections, "Database pool ready");
                return Ok(pool);
            }
            Err(e) if attempt < options.connect_attempts => {
                warn!(attempt, error = %e, "Database not reachable, retrying");
                tokio::time::sleep(options.retry_delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

async fn connect(options: &PoolOptions) -> Result<DatabasePool, EventHubError> {
    let pool = PgPoolOptions::new()
        .max_connections(options.max_connections)
        .min_connections(options.min_connections)
        .acquire_timeout(options.acquire_timeout)
        .idle_timeout(options.idle_timeout)
        .max_lifetime(options.max_lifetime)
        .connect(&options.url)
        .await?;

    health_check(&pool).await?;
    Ok(pool)
}

/// Apply pending migrations from `migrations/`
pub async fn run_migrations(pool: &DatabasePool) -> Result<(), EventHubError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    info!("Database schema is up to date");
    Ok(())
}

/// Round-trip a trivial query
pub async fn health_check(pool: &DatabasePool) -> Result<(), EventHubError> {
    let one: i32 = sqlx::query_scalar("SELECT 1").fetch_one(pool).await?;
    if one != 1 {
        return Err(EventHubError::Internal(format!("health check returned {one}")));
    }
    Ok(())
}
