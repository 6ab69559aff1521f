//! Error handling for EventHub
//!
//! This module defines the main error type used throughout the application
//! and how it is rendered over HTTP.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

/// Main error type for EventHub application
#[derive(Error, Debug)]
pub enum EventHubError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Database migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("User not found: {user_id}")]
    UserNotFound { user_id: Uuid },

    #[error("Event not found: {event_id}")]
    EventNotFound { event_id: Uuid },

    #[error("Registration not found: {registration_id}")]
    RegistrationNotFound { registration_id: Uuid },

    #[error("Notification not found: {notification_id}")]
    NotificationNotFound { notification_id: Uuid },

    #[error("Ticket type not found: {ticket_type}")]
    TicketTypeNotFound { ticket_type: String },

    #[error("Invalid state transition: {from} -> {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Password hashing error: {0}")]
    PasswordHash(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for EventHub operations
pub type Result<T> = std::result::Result<T, EventHubError>;

impl From<validator::ValidationErrors> for EventHubError {
    fn from(errors: validator::ValidationErrors) -> Self {
        EventHubError::InvalidInput(errors.to_string())
    }
}

impl From<argon2::password_hash::Error> for EventHubError {
    fn from(error: argon2::password_hash::Error) -> Self {
        EventHubError::PasswordHash(error.to_string())
    }
}

impl From<JsonRejection> for EventHubError {
    fn from(rejection: JsonRejection) -> Self {
        EventHubError::InvalidInput(rejection.body_text())
    }
}

impl From<PathRejection> for EventHubError {
    fn from(rejection: PathRejection) -> Self {
        EventHubError::InvalidInput(rejection.body_text())
    }
}

impl From<QueryRejection> for EventHubError {
    fn from(rejection: QueryRejection) -> Self {
        EventHubError::InvalidInput(rejection.body_text())
    }
}

impl From<config::ConfigError> for EventHubError {
    fn from(error: config::ConfigError) -> Self {
        EventHubError::Config(error.to_string())
    }
}

impl EventHubError {
    /// Check if the error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            EventHubError::Database(_) => false,
            EventHubError::Migration(_) => false,
            EventHubError::Redis(_) => true,
            EventHubError::Serialization(_) => false,
            EventHubError::Io(_) => true,
            EventHubError::Config(_) => false,
            EventHubError::Forbidden(_) => false,
            EventHubError::UserNotFound { .. } => false,
            EventHubError::EventNotFound { .. } => false,
            EventHubError::RegistrationNotFound { .. } => false,
            EventHubError::NotificationNotFound { .. } => false,
            EventHubError::TicketTypeNotFound { .. } => false,
            EventHubError::InvalidStateTransition { .. } => false,
            EventHubError::InvalidState(_) => false,
            EventHubError::Conflict(_) => true,
            EventHubError::Authentication(_) => false,
            EventHubError::RateLimitExceeded => true,
            EventHubError::InvalidInput(_) => false,
            EventHubError::PasswordHash(_) => false,
            EventHubError::Internal(_) => false,
        }
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            EventHubError::Database(_) => ErrorSeverity::Critical,
            EventHubError::Migration(_) => ErrorSeverity::Critical,
            EventHubError::Config(_) => ErrorSeverity::Critical,
            EventHubError::Forbidden(_) => ErrorSeverity::Warning,
            EventHubError::Authentication(_) => ErrorSeverity::Warning,
            EventHubError::RateLimitExceeded => ErrorSeverity::Warning,
            EventHubError::UserNotFound { .. }
            | EventHubError::EventNotFound { .. }
            | EventHubError::RegistrationNotFound { .. }
            | EventHubError::NotificationNotFound { .. }
            | EventHubError::TicketTypeNotFound { .. }
            | EventHubError::InvalidStateTransition { .. }
            | EventHubError::InvalidState(_)
            | EventHubError::Conflict(_)
            | EventHubError::InvalidInput(_) => ErrorSeverity::Info,
            _ => ErrorSeverity::Error,
        }
    }

    /// HTTP status the API layer answers with
    pub fn status_code(&self) -> StatusCode {
        match self {
            EventHubError::UserNotFound { .. }
            | EventHubError::EventNotFound { .. }
            | EventHubError::RegistrationNotFound { .. }
            | EventHubError::NotificationNotFound { .. }
            | EventHubError::TicketTypeNotFound { .. } => StatusCode::NOT_FOUND,
            EventHubError::Forbidden(_) => StatusCode::FORBIDDEN,
            EventHubError::Authentication(_) => StatusCode::UNAUTHORIZED,
            EventHubError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            EventHubError::InvalidStateTransition { .. }
            | EventHubError::InvalidState(_)
            | EventHubError::Conflict(_) => StatusCode::CONFLICT,
            EventHubError::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
            EventHubError::Redis(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable code for the client
    pub fn error_code(&self) -> &'static str {
        match self {
            EventHubError::UserNotFound { .. }
            | EventHubError::EventNotFound { .. }
            | EventHubError::RegistrationNotFound { .. }
            | EventHubError::NotificationNotFound { .. }
            | EventHubError::TicketTypeNotFound { .. } => "NOT_FOUND",
            EventHubError::Forbidden(_) => "FORBIDDEN",
            EventHubError::Authentication(_) => "UNAUTHENTICATED",
            EventHubError::InvalidInput(_) => "INVALID_ARGUMENT",
            EventHubError::InvalidStateTransition { .. } => "INVALID_STATE_TRANSITION",
            EventHubError::InvalidState(_) => "INVALID_STATE",
            EventHubError::Conflict(_) => "CONFLICT",
            EventHubError::RateLimitExceeded => "RATE_LIMITED",
            EventHubError::Redis(_) => "SERVICE_UNAVAILABLE",
            _ => "INTERNAL",
        }
    }

    /// Whether the message is safe to show to the client verbatim
    fn is_client_facing(&self) -> bool {
        !self.status_code().is_server_error()
    }
}

impl IntoResponse for EventHubError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = if self.is_client_facing() {
            match self.severity() {
                ErrorSeverity::Info => tracing::debug!(error = %self, "Request rejected"),
                _ => tracing::warn!(error = %self, recoverable = self.is_recoverable(), "Request rejected"),
            }
            self.to_string()
        } else {
            crate::utils::logging::log_api_error(
                self.error_code(),
                &self.to_string(),
                Some(&format!("severity={} recoverable={}", self.severity(), self.is_recoverable())),
            );
            "Internal server error".to_string()
        };

        let body = json!({
            "success": false,
            "error": self.error_code(),
            "message": message,
        });

        (status, Json(body)).into_response()
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Info => write!(f, "INFO"),
            ErrorSeverity::Warning => write!(f, "WARN"),
            ErrorSeverity::Error => write!(f, "ERROR"),
            ErrorSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}
