//! HTTP handlers module
//!
//! One file per resource. Every handler answers with the
//! `{ "success": true, "data": ... }` envelope on success; errors render
//! themselves through [`EventHubError`]'s `IntoResponse`.

pub mod admin;
pub mod auth;
pub mod events;
pub mod notifications;
pub mod payments;
pub mod registrations;
pub mod users;

use std::sync::Arc;
use axum::extract::{FromRequest, FromRequestParts, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Serialize;
use crate::config::settings::Settings;
use crate::database::DatabaseService;
use crate::services::ServiceFactory;
use crate::utils::errors::EventHubError;

/// Shared state handed to every handler
#[derive(Clone, Debug)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub db: DatabaseService,
    pub services: ServiceFactory,
}

impl AppState {
    pub fn new(settings: Settings, db: DatabaseService, services: ServiceFactory) -> Self {
        Self {
            settings: Arc::new(settings),
            db,
            services,
        }
    }
}

/// Success envelope
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

pub type Envelope<T> = axum::Json<ApiResponse<T>>;

pub type ApiResult<T> = Result<Envelope<T>, EventHubError>;

pub fn envelope<T: Serialize>(data: T) -> Envelope<T> {
    axum::Json(ApiResponse { success: true, data })
}

pub fn ok<T: Serialize>(data: T) -> ApiResult<T> {
    Ok(envelope(data))
}

pub fn created<T: Serialize>(data: T) -> Result<(StatusCode, Envelope<T>), EventHubError> {
    Ok((StatusCode::CREATED, envelope(data)))
}

/// JSON body whose rejections use the error envelope
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(EventHubError))]
pub struct ApiJson<T>(pub T);

/// Path parameters whose rejections use the error envelope
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(EventHubError))]
pub struct ApiPath<T>(pub T);

/// Query string whose rejections use the error envelope
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(EventHubError))]
pub struct ApiQuery<T>(pub T);

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let health = state.services.health_check(&state.db).await;
    let status = if health.is_healthy() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let body = serde_json::json!({
        "success": health.is_healthy(),
        "data": {
            "status": if health.is_healthy() { "ok" } else { "degraded" },
            "version": crate::VERSION,
            "checks": health,
            "issues": health.get_issues(),
        }
    });

    (status, axum::Json(body))
}
