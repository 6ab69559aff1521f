//! Authentication service implementation
//!
//! Account signup and login with Argon2 password hashes, and resolution of a
//! session token back to an active user.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use tracing::{debug, info, warn};
use uuid::Uuid;
use validator::Validate;
use crate::database::repositories::UserRepository;
use crate::models::user::{
    User, UserRole, UserStatus, CreateUserRequest, SignupRequest, LoginRequest, OrganizerProfile,
    ParticipantProfile,
};
use crate::services::session::SessionStore;
use crate::utils::errors::{EventHubError, Result};
use crate::utils::helpers::normalize_email;

const INVALID_CREDENTIALS: &str = "Invalid email or password";

#[derive(Clone, Debug)]
pub struct AuthService {
    users: UserRepository,
    sessions: SessionStore,
}

/// A signed-in user together with the session token that proves it
#[derive(Debug, Clone)]
pub struct AuthenticatedSession {
    pub user: User,
    pub token: String,
}

impl AuthService {
    pub fn new(users: UserRepository, sessions: SessionStore) -> Self {
        Self { users, sessions }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Create an account and sign it in
    pub async fn signup(&self, request: SignupRequest) -> Result<AuthenticatedSession> {
        request.validate()?;

        let email = normalize_email(&request.email);
        let mut roles = vec![UserRole::Participant];
        if request.as_organizer {
            roles.push(UserRole::Organizer);
        }

        let user = self
            .users
            .create(CreateUserRequest {
                email,
                password_hash: hash_password(&request.password)?,
                first_name: request.first_name.trim().to_string(),
                last_name: request.last_name.trim().to_string(),
                organizer_profile: request.as_organizer.then(OrganizerProfile::default),
                participant_profile: Some(ParticipantProfile::default()),
                roles,
                status: UserStatus::Unverified,
            })
            .await?;

        info!(user_id = %user.id, name = %user.full_name(), organizer = request.as_organizer, "User signed up");
        let token = self.sessions.create(user.id).await?;
        Ok(AuthenticatedSession { user, token })
    }

    /// Check credentials and open a session
    pub async fn login(&self, request: LoginRequest) -> Result<AuthenticatedSession> {
        request.validate()?;

        let email = normalize_email(&request.email);
        let Some(user) = self.users.find_by_email(&email).await? else {
            debug!("Login for unknown email");
            return Err(EventHubError::Authentication(INVALID_CREDENTIALS.to_string()));
        };

        if !verify_password(&request.password, &user.password_hash)? {
            warn!(user_id = %user.id, "Login with wrong password");
            return Err(EventHubError::Authentication(INVALID_CREDENTIALS.to_string()));
        }

        ensure_can_sign_in(&user)?;

        let token = self.sessions.create(user.id).await?;
        info!(user_id = %user.id, "User logged in");
        Ok(AuthenticatedSession { user, token })
    }

    pub async fn logout(&self, token: &str) -> Result<()> {
        self.sessions.destroy(token).await?;
        Ok(())
    }

    /// Resolve a session token to a user allowed to act
    pub async fn authenticate(&self, token: &str) -> Result<User> {
        let session = self.sessions.get(token).await?
            .ok_or_else(|| EventHubError::Authentication("Session expired or invalid".to_string()))?;

        let user = self.users.find_by_id(session.user_id).await?
            .ok_or_else(|| EventHubError::Authentication("Session user no longer exists".to_string()))?;

        ensure_can_sign_in(&user)?;
        Ok(user)
    }

    pub async fn get_user(&self, user_id: Uuid) -> Result<User> {
        self.users.find_by_id(user_id).await?
            .ok_or(EventHubError::UserNotFound { user_id })
    }
}

fn ensure_can_sign_in(user: &User) -> Result<()> {
    if user.status.can_sign_in() {
        Ok(())
    } else {
        Err(EventHubError::Forbidden(format!("Account is {}", user.status.as_str())))
    }
}

/// Hash a password with Argon2id and a random salt
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Verify a password against a stored Argon2 hash
pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(hash)?;
    Ok(Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_round_trip() {
        let hash = hash_password("correct horse battery").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("correct horse battery", &hash).unwrap());
        assert!(!verify_password("wrong", &hash).unwrap());
    }

    #[test]
    fn test_malformed_hash_is_an_error() {
        assert!(verify_password("anything", "not-a-hash").is_err());
    }
}
