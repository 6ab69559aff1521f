//! User repository implementation

use sqlx::types::Json;
use sqlx::PgPool;
use chrono::Utc;
use uuid::Uuid;
use crate::models::user::{User, UserRole, CreateUserRequest, UpdateUserRequest};
use crate::utils::errors::EventHubError;

const USER_COLUMNS: &str = "id, email, password_hash, first_name, last_name, roles, status, \
    organizer_profile, participant_profile, created_at, updated_at";

#[derive(Clone)]
#[derive(Debug)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new user; a duplicate email is reported as a conflict
    pub async fn create(&self, request: CreateUserRequest) -> Result<User, EventHubError> {
        let now = Utc::now();
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (id, email, password_hash, first_name, last_name, roles, status,
                               organizer_profile, participant_profile, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(request.email)
        .bind(request.password_hash)
        .bind(request.first_name)
        .bind(request.last_name)
        .bind(request.roles)
        .bind(request.status)
        .bind(request.organizer_profile.map(Json))
        .bind(request.participant_profile.map(Json))
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                EventHubError::Conflict("An account with this email already exists".to_string())
            }
            other => EventHubError::Database(other),
        })?;

        Ok(user)
    }

    /// Find user by ID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, EventHubError> {
        let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Find user by normalized email
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, EventHubError> {
        let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Update user; absent fields keep their current value
    pub async fn update(&self, id: Uuid, request: UpdateUserRequest) -> Result<User, EventHubError> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET first_name = COALESCE($2, first_name),
                last_name = COALESCE($3, last_name),
                roles = COALESCE($4, roles),
                status = COALESCE($5, status),
                organizer_profile = COALESCE($6, organizer_profile),
                participant_profile = COALESCE($7, participant_profile),
                updated_at = $8
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(request.first_name)
        .bind(request.last_name)
        .bind(request.roles)
        .bind(request.status)
        .bind(request.organizer_profile.map(Json))
        .bind(request.participant_profile.map(Json))
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?
        .ok_or(EventHubError::UserNotFound { user_id: id })?;

        Ok(user)
    }

    /// List users with pagination
    pub async fn list(&self, limit: i64, offset: i64) -> Result<Vec<User>, EventHubError> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC LIMIT $1 OFFSET $2"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    /// Count users holding a role
    pub async fn count_with_role(&self, role: UserRole) -> Result<i64, EventHubError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE $1 = ANY(roles)")
            .bind(role)
            .fetch_one(&self.pool)
            .await?;

        Ok(count.0)
    }

    /// Count total users
    pub async fn count(&self) -> Result<i64, EventHubError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        Ok(count.0)
    }
}
