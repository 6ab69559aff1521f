//! Event handlers

use axum::extract::State;
use axum::http::StatusCode;
use uuid::Uuid;
use crate::handlers::{created, ok, ApiJson, ApiPath, ApiQuery, ApiResult, AppState, Envelope};
use crate::middleware::{CurrentUser, MaybeUser};
use crate::models::event::{EventDetails, CreateEventRequest, UpdateEventRequest, EventListQuery};
use crate::utils::errors::EventHubError;

/// `GET /api/events`
pub async fn list(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<EventListQuery>,
) -> ApiResult<Vec<EventDetails>> {
    ok(state.services.event_service.browse(query).await?)
}

/// `GET /api/events/{id}`
pub async fn get(
    State(state): State<AppState>,
    MaybeUser(viewer): MaybeUser,
    ApiPath(event_id): ApiPath<Uuid>,
) -> ApiResult<EventDetails> {
    let viewer_id = viewer.map(|u| u.id);
    ok(state.services.event_service.get(viewer_id, event_id).await?)
}

/// `POST /api/events`
pub async fn create(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(request): ApiJson<CreateEventRequest>,
) -> Result<(StatusCode, Envelope<EventDetails>), EventHubError> {
    created(state.services.event_service.create(&user, request).await?)
}

/// `GET /api/events/mine`
pub async fn mine(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Vec<EventDetails>> {
    ok(state.services.event_service.mine(user.id).await?)
}

/// `PUT /api/events/{id}`
pub async fn update(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(event_id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<UpdateEventRequest>,
) -> ApiResult<EventDetails> {
    ok(state.services.event_service.update(user.id, event_id, request).await?)
}

/// `PUT /api/events/{id}/publish`
pub async fn publish(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(event_id): ApiPath<Uuid>,
) -> ApiResult<EventDetails> {
    ok(state.services.event_service.publish(user.id, event_id).await?)
}

/// `DELETE /api/events/{id}`
pub async fn delete(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(event_id): ApiPath<Uuid>,
) -> ApiResult<bool> {
    state.services.event_service.delete(&user, event_id).await?;
    ok(true)
}
