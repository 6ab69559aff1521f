//! Notification handlers

use axum::extract::State;
use serde::Deserialize;
use uuid::Uuid;
use crate::handlers::{ok, ApiPath, ApiQuery, ApiResult, AppState};
use crate::middleware::CurrentUser;
use crate::models::notification::{Notification, UnreadCount};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationQuery {
    #[serde(default)]
    pub unread_only: bool,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// `GET /api/notifications`
pub async fn list(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiQuery(query): ApiQuery<NotificationQuery>,
) -> ApiResult<Vec<Notification>> {
    let notifications = state
        .services
        .notification_service
        .list(user.id, query.unread_only, query.page, query.per_page)
        .await?;
    ok(notifications)
}

/// `GET /api/notifications/unread-count`
pub async fn unread_count(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<UnreadCount> {
    let unread = state.services.notification_service.unread_count(user.id).await?;
    ok(UnreadCount { unread })
}

/// `PUT /api/notifications/{id}/read`
pub async fn mark_read(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(notification_id): ApiPath<Uuid>,
) -> ApiResult<Notification> {
    ok(state.services.notification_service.mark_read(user.id, notification_id).await?)
}

/// `PUT /api/notifications/read-all`
pub async fn mark_all_read(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<u64> {
    ok(state.services.notification_service.mark_all_read(user.id).await?)
}
