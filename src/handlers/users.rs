//! Self-service account handlers

use axum::extract::State;
use crate::handlers::{ok, ApiJson, ApiResult, AppState};
use crate::middleware::CurrentUser;
use crate::models::user::{User, UpdateUserRequest, UpdateSubscriptionRequest};

/// `PUT /api/users/me/profile`
pub async fn update_profile(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(request): ApiJson<UpdateUserRequest>,
) -> ApiResult<User> {
    ok(state.services.user_service.update_profile(&user, request).await?)
}

/// `PUT /api/users/me/subscription`
pub async fn update_subscription(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(request): ApiJson<UpdateSubscriptionRequest>,
) -> ApiResult<User> {
    ok(state.services.user_service.update_subscription(&user, request.plan).await?)
}
