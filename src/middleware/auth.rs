//! Authentication extractors
//!
//! Handlers ask for [`CurrentUser`] when a session is required and for
//! [`MaybeUser`] when anonymous access is allowed.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::extract::CookieJar;
use tracing::debug;
use crate::handlers::AppState;
use crate::models::user::User;
use crate::services::user::require_admin;
use crate::utils::errors::EventHubError;

/// The signed-in user behind the session cookie
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// A signed-in administrator
#[derive(Debug, Clone)]
pub struct AdminUser(pub User);

/// The signed-in user, if the request carries a usable session
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<User>);

/// Session token from the request cookies
pub fn session_token(parts: &Parts, cookie_name: &str) -> Option<String> {
    CookieJar::from_headers(&parts.headers)
        .get(cookie_name)
        .map(|cookie| cookie.value().to_string())
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = EventHubError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = session_token(parts, &state.settings.auth.cookie_name)
            .ok_or_else(|| EventHubError::Authentication("Not signed in".to_string()))?;

        let user = state.services.auth_service.authenticate(&token).await?;
        Ok(CurrentUser(user))
    }
}

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = EventHubError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
        require_admin(&user)?;
        Ok(AdminUser(user))
    }
}

impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = EventHubError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        match CurrentUser::from_request_parts(parts, state).await {
            Ok(CurrentUser(user)) => Ok(MaybeUser(Some(user))),
            Err(EventHubError::Authentication(_) | EventHubError::Forbidden(_)) => {
                debug!("Continuing anonymously");
                Ok(MaybeUser(None))
            }
            Err(e) => Err(e),
        }
    }
}
