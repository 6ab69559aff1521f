//! Application settings management
//!
//! This module defines the configuration structure and provides methods
//! for loading settings from TOML files and environment variables.

use serde::{Deserialize, Serialize};

/// Main application configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub auth: AuthConfig,
    pub registration: RegistrationConfig,
    pub payments: PaymentsConfig,
    pub rate_limit: RateLimitConfig,
    pub logging: LoggingConfig,
    pub features: FeaturesConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Origins of the single-page frontend allowed to send credentialed requests
    pub cors_origins: Vec<String>,
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

/// Redis configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RedisConfig {
    pub url: String,
    pub prefix: String,
    pub session_ttl_seconds: u64,
}

/// Session cookie configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    pub cookie_name: String,
    pub cookie_secure: bool,
}

/// Registration policy defaults
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RegistrationConfig {
    /// Applied to new events that do not state their own approval policy
    pub default_requires_approval: bool,
}

/// Simulated payment configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PaymentsConfig {
    pub simulated_delay_ms: u64,
}

/// Rate limiting configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RateLimitConfig {
    pub requests_per_minute: u32,
    pub burst: u32,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub file_path: String,
    pub json: bool,
}

/// Feature flags configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FeaturesConfig {
    pub rate_limiting: bool,
    pub notifications: bool,
}

impl Settings {
    /// Load settings from configuration file and environment variables
    ///
    /// Values not present in either source fall back to [`Settings::default`].
    pub fn new() -> Result<Self, config::ConfigError> {
        let d = Settings::default();

        let settings = config::Config::builder()
            .set_default("server.host", d.server.host)?
            .set_default("server.port", i64::from(d.server.port))?
            .set_default("server.cors_origins", d.server.cors_origins)?
            .set_default("database.url", d.database.url)?
            .set_default("database.max_connections", i64::from(d.database.max_connections))?
            .set_default("database.min_connections", i64::from(d.database.min_connections))?
            .set_default("redis.url", d.redis.url)?
            .set_default("redis.prefix", d.redis.prefix)?
            .set_default("redis.session_ttl_seconds", d.redis.session_ttl_seconds as i64)?
            .set_default("auth.cookie_name", d.auth.cookie_name)?
            .set_default("auth.cookie_secure", d.auth.cookie_secure)?
            .set_default("registration.default_requires_approval", d.registration.default_requires_approval)?
            .set_default("payments.simulated_delay_ms", d.payments.simulated_delay_ms as i64)?
            .set_default("rate_limit.requests_per_minute", i64::from(d.rate_limit.requests_per_minute))?
            .set_default("rate_limit.burst", i64::from(d.rate_limit.burst))?
            .set_default("logging.level", d.logging.level)?
            .set_default("logging.file_path", d.logging.file_path)?
            .set_default("logging.json", d.logging.json)?
            .set_default("features.rate_limiting", d.features.rate_limiting)?
            .set_default("features.notifications", d.features.notifications)?
            .add_source(config::File::with_name("config").required(false))
            .add_source(
                config::Environment::with_prefix("EVENTHUB")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("server.cors_origins")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<(), crate::utils::errors::EventHubError> {
        super::validation::validate_settings(self)
    }

    /// Socket address string the server binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
                cors_origins: vec!["http://localhost:5173".to_string()],
            },
            database: DatabaseConfig {
                url: "postgresql://localhost/eventhub".to_string(),
                max_connections: 10,
                min_connections: 1,
            },
            redis: RedisConfig {
                url: "redis://localhost:6379".to_string(),
                prefix: "eventhub:".to_string(),
                session_ttl_seconds: 60 * 60 * 24 * 7,
            },
            auth: AuthConfig {
                cookie_name: "eventhub_session".to_string(),
                cookie_secure: false,
            },
            registration: RegistrationConfig {
                default_requires_approval: true,
            },
            payments: PaymentsConfig {
                simulated_delay_ms: 500,
            },
            rate_limit: RateLimitConfig {
                requests_per_minute: 120,
                burst: 20,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                file_path: "logs".to_string(),
                json: false,
            },
            features: FeaturesConfig {
                rate_limiting: true,
                notifications: true,
            },
        }
    }
}
