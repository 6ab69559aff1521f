//! Database service layer
//!
//! This module bundles the repositories behind one cloneable handle

use crate::database::{
    DatabasePool, UserRepository, EventRepository, RegistrationRepository, NotificationRepository,
};
use crate::models::UserRole;
use crate::utils::errors::EventHubError;

#[derive(Debug, Clone)]
pub struct DatabaseService {
    pub users: UserRepository,
    pub events: EventRepository,
    pub registrations: RegistrationRepository,
    pub notifications: NotificationRepository,
    pool: DatabasePool,
}

impl DatabaseService {
    pub fn new(pool: DatabasePool) -> Self {
        Self {
            users: UserRepository::new(pool.clone()),
            events: EventRepository::new(pool.clone()),
            registrations: RegistrationRepository::new(pool.clone()),
            notifications: NotificationRepository::new(pool.clone()),
            pool,
        }
    }

    pub fn pool(&self) -> &DatabasePool {
        &self.pool
    }

    /// Get system statistics
    pub async fn get_system_stats(&self) -> Result<serde_json::Value, EventHubError> {
        let users = self.users.count().await?;
        let organizers = self.users.count_with_role(UserRole::Organizer).await?;
        let events = self.events.count().await?;
        let registrations = self.registrations.count().await?;

        Ok(serde_json::json!({
            "users": users,
            "organizers": organizers,
            "events": events,
            "registrations": registrations,
        }))
    }
}
