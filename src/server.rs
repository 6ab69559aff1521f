//! HTTP server: router assembly and serving

use std::net::SocketAddr;
use std::time::Duration;
use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use crate::handlers::{self, admin, auth, events, notifications, payments, registrations, users, AppState};
use crate::middleware::{log_request, rate_limit_middleware, RateLimitMiddleware};
use crate::utils::errors::{EventHubError, Result};

const RATE_LIMIT_CLEANUP_INTERVAL: Duration = Duration::from_secs(300);

/// `/api` routes
fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(auth::signup))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me))
        .route("/users/me/profile", put(users::update_profile))
        .route("/users/me/subscription", put(users::update_subscription))
        .route("/events", get(events::list).post(events::create))
        .route("/events/mine", get(events::mine))
        .route("/events/{id}", get(events::get).put(events::update).delete(events::delete))
        .route("/events/{id}/publish", put(events::publish))
        .route("/registrations/register", post(registrations::register))
        .route("/registrations/my-registrations", get(registrations::my_registrations))
        .route("/registrations/cancel/{id}", put(registrations::cancel))
        .route("/registrations/check/{event_id}", get(registrations::check))
        .route("/registrations/event/{event_id}", get(registrations::event_registrations))
        .route("/registrations/update-status/{id}", put(registrations::update_status))
        .route("/registrations/saved-events", get(registrations::saved_events))
        .route(
            "/registrations/saved-events/{event_id}",
            post(registrations::save_event).delete(registrations::unsave_event),
        )
        .route("/payments/process", post(payments::process))
        .route("/notifications", get(notifications::list))
        .route("/notifications/unread-count", get(notifications::unread_count))
        .route("/notifications/read-all", put(notifications::mark_all_read))
        .route("/notifications/{id}/read", put(notifications::mark_read))
        .route("/admin/users", get(admin::list_users))
        .route("/admin/users/{id}", axum::routing::delete(admin::delete_user))
        .route("/admin/users/{id}/status", put(admin::set_status))
        .route("/admin/users/{id}/roles", put(admin::set_roles))
        .route("/admin/users/{id}/subscription", put(admin::set_subscription))
        .route("/admin/stats", get(admin::stats))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .allow_credentials(true)
}

/// Build the application router
pub fn build_router(state: AppState) -> Result<Router> {
    let mut api = api_routes();

    if state.settings.features.rate_limiting {
        let limiter = RateLimitMiddleware::new(&state.settings.rate_limit)?;
        spawn_rate_limit_cleanup(limiter.clone());
        api = api.layer(axum::middleware::from_fn_with_state(limiter, rate_limit_middleware));
    }

    let router = Router::new()
        .route("/health", get(handlers::health))
        .nest("/api", api)
        .layer(axum::middleware::from_fn(log_request))
        .layer(cors_layer(&state.settings.server.cors_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    Ok(router)
}

fn spawn_rate_limit_cleanup(limiter: RateLimitMiddleware) {
    // Outside a runtime (plain unit tests) there is nothing to clean up.
    if let Ok(handle) = tokio::runtime::Handle::try_current() {
        handle.spawn(async move {
            let mut interval = tokio::time::interval(RATE_LIMIT_CLEANUP_INTERVAL);
            loop {
                interval.tick().await;
                limiter.cleanup();
            }
        });
    }
}

/// Bind and serve until Ctrl+C or SIGTERM
pub async fn serve(state: AppState) -> Result<()> {
    let addr = state.settings.bind_address();
    let router = build_router(state)?;

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server listening on {}", listener.local_addr()?);

    axum::serve(listener, router.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(EventHubError::Io)?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C signal"),
        _ = terminate => info!("Received SIGTERM signal"),
    }
}
