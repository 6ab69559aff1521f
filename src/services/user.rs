//! User service implementation
//!
//! Self-service profile and subscription changes, plus the admin account
//! operations.

use tracing::{debug, info};
use uuid::Uuid;
use validator::Validate;
use crate::database::DatabaseService;
use crate::models::user::{
    User, UserRole, UserStatus, SubscriptionPlan, OrganizerProfile, UpdateUserRequest,
};
use crate::utils::errors::{EventHubError, Result};
use crate::utils::helpers::page_to_limit_offset;
use crate::utils::logging::log_admin_action;

#[derive(Clone, Debug)]
pub struct UserService {
    db: DatabaseService,
}

impl UserService {
    pub fn new(db: DatabaseService) -> Self {
        Self { db }
    }

    /// Update the caller's own names and profiles
    pub async fn update_profile(&self, user: &User, mut request: UpdateUserRequest) -> Result<User> {
        request.validate()?;
        request.roles = None;
        request.status = None;

        if let Some(profile) = request.organizer_profile.as_mut() {
            if !user.has_role(UserRole::Organizer) {
                return Err(EventHubError::Forbidden("Only organizers have an organizer profile".to_string()));
            }
            // The plan only changes through the subscription endpoints.
            profile.subscription_plan = user.subscription_plan().unwrap_or_default();
        }

        debug!(user_id = %user.id, "Updating user profile");
        self.db.users.update(user.id, request).await
    }

    /// Change the caller's own subscription plan
    pub async fn update_subscription(&self, user: &User, plan: SubscriptionPlan) -> Result<User> {
        if !user.has_role(UserRole::Organizer) {
            return Err(EventHubError::Forbidden("Only organizers have a subscription".to_string()));
        }

        let updated = self.set_plan(user, plan).await?;
        info!(user_id = %user.id, plan = ?plan, "Subscription changed");
        Ok(updated)
    }

    /// Users, newest first
    pub async fn list_users(&self, admin: &User, page: Option<i64>, per_page: Option<i64>) -> Result<Vec<User>> {
        require_admin(admin)?;
        let (limit, offset) = page_to_limit_offset(page, per_page);
        self.db.users.list(limit, offset).await
    }

    pub async fn set_status(&self, admin: &User, user_id: Uuid, status: UserStatus) -> Result<User> {
        require_admin(admin)?;
        if admin.id == user_id && !status.can_sign_in() {
            return Err(EventHubError::Conflict("Administrators cannot lock themselves out".to_string()));
        }

        let user = self
            .db
            .users
            .update(user_id, UpdateUserRequest { status: Some(status), ..Default::default() })
            .await?;

        log_admin_action(admin.id, "set_status", Some(&user_id.to_string()), Some(status.as_str()));
        Ok(user)
    }

    pub async fn set_roles(&self, admin: &User, user_id: Uuid, roles: Vec<UserRole>) -> Result<User> {
        require_admin(admin)?;

        let mut roles = roles;
        roles.sort_by_key(|r| *r as u8);
        roles.dedup();
        if roles.is_empty() {
            return Err(EventHubError::InvalidInput("A user needs at least one role".to_string()));
        }
        if admin.id == user_id && !roles.contains(&UserRole::Admin) {
            return Err(EventHubError::Conflict("Administrators cannot remove their own ADMIN role".to_string()));
        }

        let target = self.get_user(user_id).await?;
        let organizer_profile = (roles.contains(&UserRole::Organizer) && target.organizer_profile.is_none())
            .then(OrganizerProfile::default);

        let details = format!("{roles:?}");
        let user = self
            .db
            .users
            .update(user_id, UpdateUserRequest {
                roles: Some(roles),
                organizer_profile,
                ..Default::default()
            })
            .await?;

        log_admin_action(admin.id, "set_roles", Some(&user_id.to_string()), Some(&details));
        Ok(user)
    }

    pub async fn set_subscription(&self, admin: &User, user_id: Uuid, plan: SubscriptionPlan) -> Result<User> {
        require_admin(admin)?;

        let target = self.get_user(user_id).await?;
        if !target.has_role(UserRole::Organizer) {
            return Err(EventHubError::InvalidInput("Only organizers have a subscription".to_string()));
        }

        let user = self.set_plan(&target, plan).await?;
        log_admin_action(admin.id, "set_subscription", Some(&user_id.to_string()), Some(&format!("{plan:?}")));
        Ok(user)
    }

    pub async fn delete_user(&self, admin: &User, user_id: Uuid) -> Result<()> {
        require_admin(admin)?;
        if admin.id == user_id {
            return Err(EventHubError::Conflict("Administrators cannot delete themselves".to_string()));
        }

        let cancelled = self.db.registrations.cancel_all_and_delete_attendee(user_id).await?
            .ok_or(EventHubError::UserNotFound { user_id })?;

        log_admin_action(
            admin.id,
            "delete_user",
            Some(&user_id.to_string()),
            Some(&format!("{} registrations cancelled", cancelled.len())),
        );
        Ok(())
    }

    /// Counters for the admin dashboard
    pub async fn stats(&self, admin: &User) -> Result<serde_json::Value> {
        require_admin(admin)?;
        self.db.get_system_stats().await
    }

    pub async fn get_user(&self, user_id: Uuid) -> Result<User> {
        self.db.users.find_by_id(user_id).await?
            .ok_or(EventHubError::UserNotFound { user_id })
    }

    async fn set_plan(&self, user: &User, plan: SubscriptionPlan) -> Result<User> {
        let mut profile = user.organizer_profile.as_ref().map(|p| p.0.clone()).unwrap_or_default();
        profile.subscription_plan = plan;

        self.db
            .users
            .update(user.id, UpdateUserRequest { organizer_profile: Some(profile), ..Default::default() })
            .await
    }
}

pub fn require_admin(user: &User) -> Result<()> {
    if user.is_admin() {
        Ok(())
    } else {
        Err(EventHubError::Forbidden("Administrator role required".to_string()))
    }
}
