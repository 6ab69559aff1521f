//! Administrator handlers

use axum::extract::State;
use serde::Deserialize;
use uuid::Uuid;
use crate::handlers::{ok, ApiJson, ApiPath, ApiQuery, ApiResult, AppState};
use crate::middleware::AdminUser;
use crate::models::user::{User, UpdateUserStatusRequest, UpdateUserRolesRequest, UpdateSubscriptionRequest};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserListQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// `GET /api/admin/users`
pub async fn list_users(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    ApiQuery(query): ApiQuery<UserListQuery>,
) -> ApiResult<Vec<User>> {
    ok(state.services.user_service.list_users(&admin, query.page, query.per_page).await?)
}

/// `PUT /api/admin/users/{id}/status`
pub async fn set_status(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    ApiPath(user_id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<UpdateUserStatusRequest>,
) -> ApiResult<User> {
    ok(state.services.user_service.set_status(&admin, user_id, request.status).await?)
}

/// `PUT /api/admin/users/{id}/roles`
pub async fn set_roles(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    ApiPath(user_id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<UpdateUserRolesRequest>,
) -> ApiResult<User> {
    ok(state.services.user_service.set_roles(&admin, user_id, request.roles).await?)
}

/// `PUT /api/admin/users/{id}/subscription`
pub async fn set_subscription(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    ApiPath(user_id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<UpdateSubscriptionRequest>,
) -> ApiResult<User> {
    ok(state.services.user_service.set_subscription(&admin, user_id, request.plan).await?)
}

/// `DELETE /api/admin/users/{id}`
pub async fn delete_user(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    ApiPath(user_id): ApiPath<Uuid>,
) -> ApiResult<bool> {
    state.services.user_service.delete_user(&admin, user_id).await?;
    ok(true)
}

/// `GET /api/admin/stats`
pub async fn stats(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
) -> ApiResult<serde_json::Value> {
    ok(state.services.user_service.stats(&admin).await?)
}
