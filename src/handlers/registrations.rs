//! Registration handlers, saved events included

use axum::extract::State;
use axum::http::StatusCode;
use uuid::Uuid;
use crate::handlers::{created, ok, ApiJson, ApiPath, ApiResult, AppState, Envelope};
use crate::middleware::CurrentUser;
use crate::models::event::EventDetails;
use crate::models::registration::{
    Registration, RegistrationSummary, RegistrationCheck, CreateRegistrationRequest,
    UpdateRegistrationStatusRequest,
};
use crate::utils::errors::EventHubError;

/// `POST /api/registrations/register`
pub async fn register(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(request): ApiJson<CreateRegistrationRequest>,
) -> Result<(StatusCode, Envelope<Registration>), EventHubError> {
    created(state.services.registration_service.register(user.id, request).await?)
}

/// `GET /api/registrations/my-registrations`
pub async fn my_registrations(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Vec<RegistrationSummary>> {
    ok(state.services.registration_service.my_registrations(user.id).await?)
}

/// `PUT /api/registrations/cancel/{id}`
pub async fn cancel(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(registration_id): ApiPath<Uuid>,
) -> ApiResult<Registration> {
    ok(state.services.registration_service.cancel(user.id, registration_id).await?)
}

/// `GET /api/registrations/check/{eventId}`
pub async fn check(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(event_id): ApiPath<Uuid>,
) -> ApiResult<RegistrationCheck> {
    ok(state.services.registration_service.check(event_id, user.id).await?)
}

/// `GET /api/registrations/event/{eventId}`
pub async fn event_registrations(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(event_id): ApiPath<Uuid>,
) -> ApiResult<Vec<RegistrationSummary>> {
    ok(state.services.registration_service.event_registrations(user.id, event_id).await?)
}

/// `PUT /api/registrations/update-status/{id}`
pub async fn update_status(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(registration_id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<UpdateRegistrationStatusRequest>,
) -> ApiResult<Registration> {
    ok(state.services.registration_service.update_status(user.id, registration_id, request.status).await?)
}

/// `GET /api/registrations/saved-events`
pub async fn saved_events(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Vec<EventDetails>> {
    ok(state.services.event_service.saved(user.id).await?)
}

/// `POST /api/registrations/saved-events/{eventId}`
pub async fn save_event(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(event_id): ApiPath<Uuid>,
) -> ApiResult<bool> {
    state.services.event_service.save(user.id, event_id).await?;
    ok(true)
}

/// `DELETE /api/registrations/saved-events/{eventId}`
pub async fn unsave_event(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(event_id): ApiPath<Uuid>,
) -> ApiResult<bool> {
    state.services.event_service.unsave(user.id, event_id).await?;
    ok(true)
}
