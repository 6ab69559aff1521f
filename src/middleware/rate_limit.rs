//! Rate limiting middleware
//!
//! One token bucket per client IP in front of the `/api` routes.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::num::NonZeroU32;
use std::sync::Arc;
use axum::extract::{ConnectInfo, Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use governor::clock::{Clock, DefaultClock};
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use tracing::{debug, warn};
use crate::config::RateLimitConfig;
use crate::utils::errors::{EventHubError, Result};

/// Keyed limiter shared by every request handler
#[derive(Clone)]
pub struct RateLimitMiddleware {
    limiter: Arc<DefaultKeyedRateLimiter<IpAddr>>,
    clock: DefaultClock,
}

impl std::fmt::Debug for RateLimitMiddleware {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimitMiddleware")
            .field("tracked_clients", &self.limiter.len())
            .finish()
    }
}

impl RateLimitMiddleware {
    /// Create a limiter allowing `requests_per_minute` with `burst` headroom
    pub fn new(config: &RateLimitConfig) -> Result<Self> {
        let per_minute = NonZeroU32::new(config.requests_per_minute)
            .ok_or_else(|| EventHubError::Config("rate_limit.requests_per_minute must be greater than 0".to_string()))?;
        let burst = NonZeroU32::new(config.burst)
            .ok_or_else(|| EventHubError::Config("rate_limit.burst must be greater than 0".to_string()))?;

        let quota = Quota::per_minute(per_minute).allow_burst(burst);
        Ok(Self {
            limiter: Arc::new(RateLimiter::keyed(quota)),
            clock: DefaultClock::default(),
        })
    }

    /// Check whether `client` may make another request
    pub fn check(&self, client: IpAddr) -> Result<()> {
        match self.limiter.check_key(&client) {
            Ok(()) => Ok(()),
            Err(not_until) => {
                let wait = not_until.wait_time_from(self.clock.now());
                warn!(client = %client, retry_after_secs = wait.as_secs(), "Rate limit exceeded");
                Err(EventHubError::RateLimitExceeded)
            }
        }
    }

    /// Forget clients whose buckets have refilled
    pub fn cleanup(&self) {
        self.limiter.retain_recent();
        self.limiter.shrink_to_fit();
        debug!(tracked_clients = self.limiter.len(), "Rate limiter cleaned up");
    }
}

/// Client address from the connection, or a shared fallback key
fn client_ip(req: &Request) -> IpAddr {
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
}

pub async fn rate_limit_middleware(
    State(limiter): State<RateLimitMiddleware>,
    req: Request,
    next: Next,
) -> Response {
    if let Err(e) = limiter.check(client_ip(&req)) {
        let mut response = e.into_response();
        response.headers_mut().insert(header::RETRY_AFTER, header::HeaderValue::from_static("60"));
        return response;
    }

    next.run(req).await
}
