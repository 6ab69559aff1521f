//! Account handlers: signup, login, logout, me

use axum::extract::State;
use axum_extra::extract::cookie::{Cookie, SameSite};
use axum_extra::extract::CookieJar;
use crate::handlers::{envelope, ok, ApiJson, ApiResult, AppState, Envelope};
use crate::middleware::CurrentUser;
use crate::models::user::{User, SignupRequest, LoginRequest};
use crate::utils::errors::EventHubError;

fn session_cookie(state: &AppState, token: String) -> Cookie<'static> {
    Cookie::build((state.settings.auth.cookie_name.clone(), token))
        .path("/")
        .http_only(true)
        .secure(state.settings.auth.cookie_secure)
        .same_site(SameSite::Lax)
        .build()
}

/// `POST /api/auth/signup`
pub async fn signup(
    State(state): State<AppState>,
    jar: CookieJar,
    ApiJson(request): ApiJson<SignupRequest>,
) -> Result<(CookieJar, Envelope<User>), EventHubError> {
    let session = state.services.auth_service.signup(request).await?;
    let jar = jar.add(session_cookie(&state, session.token));
    Ok((jar, envelope(session.user)))
}

/// `POST /api/auth/login`
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<(CookieJar, Envelope<User>), EventHubError> {
    let session = state.services.auth_service.login(request).await?;
    let jar = jar.add(session_cookie(&state, session.token));
    Ok((jar, envelope(session.user)))
}

/// `POST /api/auth/logout`
pub async fn logout(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    jar: CookieJar,
) -> Result<(CookieJar, Envelope<bool>), EventHubError> {
    let cookie_name = state.settings.auth.cookie_name.clone();
    if let Some(cookie) = jar.get(&cookie_name) {
        state.services.auth_service.logout(cookie.value()).await?;
    }

    let jar = jar.remove(Cookie::build((cookie_name, "")).path("/"));
    Ok((jar, envelope(true)))
}

/// `GET /api/auth/me`
pub async fn me(CurrentUser(user): CurrentUser) -> ApiResult<User> {
    ok(user)
}
