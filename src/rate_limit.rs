//! Rate limiting for the login endpoint.
//!
//! Uses a token bucket algorithm with per-IP tracking to slow down password guessing.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{Quota, RateLimiter, clock::DefaultClock, state::keyed::DefaultKeyedStateStore};
use std::{num::NonZeroU32, sync::Arc};

use crate::api::ApiError;
use crate::auth::extract_client_ip;

/// Per-IP rate limiter.
pub type IpLimiter = RateLimiter<String, DefaultKeyedStateStore<String>, DefaultClock>;

/// Default number of login attempts an IP may make before being throttled.
pub const DEFAULT_LOGIN_BURST: u32 = 10;

/// Rate limiting state for the login route.
#[derive(Clone)]
pub struct LoginRateLimit {
    limiter: Arc<IpLimiter>,
    trust_proxy: bool,
}

impl LoginRateLimit {
    /// Allow `burst` attempts per IP, replenished at `burst` per minute.
    /// A zero burst is treated as one.
    pub fn new(burst: u32, trust_proxy: bool) -> Self {
        let burst = NonZeroU32::new(burst).unwrap_or(NonZeroU32::MIN);
        Self {
            limiter: Arc::new(RateLimiter::keyed(Quota::per_minute(burst))),
            trust_proxy,
        }
    }

    /// Whether the client IP is taken from X-Forwarded-For.
    pub fn trust_proxy(&self) -> bool {
        self.trust_proxy
    }

    /// Forget IPs whose buckets have refilled. Returns the number still tracked.
    pub fn prune(&self) -> usize {
        self.limiter.retain_recent();
        self.limiter.shrink_to_fit();
        self.limiter.len()
    }
}

/// Middleware for rate limiting login attempts.
pub async fn rate_limit_login(
    State(config): State<LoginRateLimit>,
    request: Request,
    next: Next,
) -> Response {
    let ip = match extract_client_ip(&request, config.trust_proxy) {
        Ok(ip) => ip,
        Err(reason) => {
            tracing::warn!(reason, "Unable to determine client IP for login");
            return ApiError::forbidden("Unable to determine client IP").into_response();
        }
    };

    match config.limiter.check_key(&ip) {
        Ok(_) => next.run(request).await,
        Err(_) => {
            tracing::warn!(ip = %ip, "Login rate limit exceeded");
            ApiError::too_many_requests("Too many login attempts. Please wait before trying again.")
                .into_response()
        }
    }
}
