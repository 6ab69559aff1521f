//! User model

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;
use super::event::EventCategory;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    Participant,
    Organizer,
    Admin,
}

// `roles` is a `user_role[]` column
impl sqlx::postgres::PgHasArrayType for UserRole {
    fn array_type_info() -> sqlx::postgres::PgTypeInfo {
        sqlx::postgres::PgTypeInfo::with_name("_user_role")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserStatus {
    Active,
    Inactive,
    Suspended,
    Unverified,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Active => "ACTIVE",
            UserStatus::Inactive => "INACTIVE",
            UserStatus::Suspended => "SUSPENDED",
            UserStatus::Unverified => "UNVERIFIED",
        }
    }

    /// INACTIVE and SUSPENDED accounts cannot sign in or use a session
    pub fn can_sign_in(&self) -> bool {
        matches!(self, UserStatus::Active | UserStatus::Unverified)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubscriptionPlan {
    #[default]
    Free,
    Premium,
    Enterprise,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct OrganizerProfile {
    #[validate(length(max = 200))]
    pub organization_name: Option<String>,
    #[validate(url)]
    pub website: Option<String>,
    #[serde(default)]
    pub subscription_plan: SubscriptionPlan,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantPreferences {
    #[serde(default)]
    pub categories: Vec<EventCategory>,
    #[serde(default = "default_true")]
    pub email_notifications: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantProfile {
    #[serde(default)]
    pub preferences: ParticipantPreferences,
}

impl Default for ParticipantPreferences {
    fn default() -> Self {
        Self {
            categories: Vec::new(),
            email_notifications: true,
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub roles: Vec<UserRole>,
    pub status: UserStatus,
    pub organizer_profile: Option<Json<OrganizerProfile>>,
    pub participant_profile: Option<Json<ParticipantProfile>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn has_role(&self, role: UserRole) -> bool {
        self.roles.contains(&role)
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(UserRole::Admin)
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }

    pub fn subscription_plan(&self) -> Option<SubscriptionPlan> {
        self.organizer_profile.as_ref().map(|p| p.0.subscription_plan)
    }
}

/// Body of `POST /api/auth/signup`
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
    #[validate(length(min = 1, max = 100))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100))]
    pub last_name: String,
    #[serde(default)]
    pub as_organizer: bool,
}

/// Body of `POST /api/auth/login`
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct CreateUserRequest {
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub roles: Vec<UserRole>,
    pub status: UserStatus,
    pub organizer_profile: Option<OrganizerProfile>,
    pub participant_profile: Option<ParticipantProfile>,
}

/// Partial update; `None` leaves the column unchanged
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, max = 100))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub last_name: Option<String>,
    #[serde(skip)]
    pub roles: Option<Vec<UserRole>>,
    #[serde(skip)]
    pub status: Option<UserStatus>,
    #[validate(nested)]
    pub organizer_profile: Option<OrganizerProfile>,
    pub participant_profile: Option<ParticipantProfile>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSubscriptionRequest {
    pub plan: SubscriptionPlan,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserStatusRequest {
    pub status: UserStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRolesRequest {
    pub roles: Vec<UserRole>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hash_never_serialized() {
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email: "ada@example.com".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            roles: vec![UserRole::Participant],
            status: UserStatus::Unverified,
            organizer_profile: None,
            participant_profile: None,
            created_at: now,
            updated_at: now,
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("argon2"));
        assert!(json.contains("\"firstName\":\"Ada\""));
        assert_eq!(user.full_name(), "Ada Lovelace");
    }

    #[test]
    fn test_roles_bind_as_enum_array() {
        use sqlx::postgres::PgHasArrayType;
        use sqlx::TypeInfo;
        assert_eq!(UserRole::array_type_info().name(), "_user_role");
    }

    #[test]
    fn test_sign_in_statuses() {
        assert!(UserStatus::Active.can_sign_in());
        assert!(UserStatus::Unverified.can_sign_in());
        assert!(!UserStatus::Suspended.can_sign_in());
        assert!(!UserStatus::Inactive.can_sign_in());
    }

    #[test]
    fn test_signup_validation() {
        let request = SignupRequest {
            email: "not-an-email".to_string(),
            password: "short".to_string(),
            first_name: "A".to_string(),
            last_name: "B".to_string(),
            as_organizer: false,
        };
        let errors = request.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("email"));
        assert!(errors.field_errors().contains_key("password"));
    }

    #[test]
    fn test_participant_preferences_defaults() {
        let profile: ParticipantProfile = serde_json::from_str("{}").unwrap();
        assert!(profile.preferences.email_notifications);
        assert!(profile.preferences.categories.is_empty());
    }
}
