//! Services module
//!
//! This module contains business logic services

pub mod auth;
pub mod event;
pub mod lifecycle;
pub mod notification;
pub mod payment;
pub mod registration;
pub mod session;
pub mod user;

// Re-export commonly used services
pub use auth::{AuthService, AuthenticatedSession};
pub use event::EventService;
pub use notification::NotificationService;
pub use payment::{PaymentService, PaymentGateway, SimulatedGateway, PaymentDetails, ProcessPaymentRequest, PaymentReceipt};
pub use registration::RegistrationService;
pub use session::{SessionStore, Session};
pub use user::UserService;

use std::sync::Arc;
use crate::config::settings::Settings;
use crate::database::DatabaseService;

/// Service factory for creating and managing all services
#[derive(Clone, Debug)]
pub struct ServiceFactory {
    pub auth_service: AuthService,
    pub user_service: UserService,
    pub event_service: EventService,
    pub registration_service: RegistrationService,
    pub payment_service: PaymentService,
    pub notification_service: NotificationService,
}

impl ServiceFactory {
    /// Create a new ServiceFactory with the simulated payment gateway
    pub fn new(settings: &Settings, db: DatabaseService, redis_client: ::redis::Client) -> Self {
        let gateway = SimulatedGateway::new(std::time::Duration::from_millis(settings.payments.simulated_delay_ms));
        Self::with_gateway(settings, db, redis_client, Arc::new(gateway))
    }

    /// Create a ServiceFactory charging through `gateway`
    pub fn with_gateway(
        settings: &Settings,
        db: DatabaseService,
        redis_client: ::redis::Client,
        gateway: Arc<dyn PaymentGateway>,
    ) -> Self {
        let sessions = SessionStore::new(redis_client, settings);
        let notification_service = NotificationService::new(db.notifications.clone(), settings);

        Self {
            auth_service: AuthService::new(db.users.clone(), sessions),
            user_service: UserService::new(db.clone()),
            event_service: EventService::new(db.clone(), notification_service.clone(), settings),
            registration_service: RegistrationService::new(db.clone(), notification_service.clone()),
            payment_service: PaymentService::new(db, gateway, notification_service.clone()),
            notification_service,
        }
    }

    /// Health check for the backing stores
    pub async fn health_check(&self, db: &DatabaseService) -> ServiceHealthStatus {
        let database_healthy = crate::database::health_check(db.pool()).await.is_ok();
        let redis_healthy = self.auth_service.sessions().health_check().await.is_ok();

        ServiceHealthStatus {
            database_healthy,
            redis_healthy,
        }
    }
}

/// Health status of the backing stores
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceHealthStatus {
    pub database_healthy: bool,
    pub redis_healthy: bool,
}

impl ServiceHealthStatus {
    pub fn is_healthy(&self) -> bool {
        self.database_healthy && self.redis_healthy
    }

    /// Get list of unhealthy stores
    pub fn get_issues(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if !self.database_healthy {
            issues.push("Database connection failed".to_string());
        }
        if !self.redis_healthy {
            issues.push("Redis connection failed".to_string());
        }

        issues
    }
}
