//! Optional global request budget, shared by every client

use std::num::NonZeroU32;
use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use governor::{clock::DefaultClock, state::InMemoryState, state::NotKeyed, Quota, RateLimiter};

use super::error::ApiError;
use super::ApiState;

/// Unkeyed limiter: one bucket for the whole relay
pub type SharedLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

/// Allow `per_minute` turns, refilled evenly over the minute (0 is treated as 1)
pub fn create_limiter(per_minute: u32) -> SharedLimiter {
    let quota = Quota::per_minute(NonZeroU32::new(per_minute).unwrap_or(NonZeroU32::MIN));
    Arc::new(RateLimiter::direct(quota))
}

/// Reject with `rate_limited` once the bucket is empty; passes through when unconfigured
pub async fn rate_limit_middleware(
    State(state): State<Arc<ApiState>>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(limiter) = state.rate_limiter.as_ref() else {
        return Ok(next.run(req).await);
    };

    if let Err(not_until) = limiter.check() {
        let wait = not_until.wait_time_from(governor::clock::Clock::now(&DefaultClock::default()));
        tracing::warn!(
            method = %req.method(),
            path = %req.uri().path(),
            retry_after_ms = u64::try_from(wait.as_millis()).unwrap_or(u64::MAX),
            "request budget exhausted"
        );
        return Err(ApiError::RateLimited);
    }

    Ok(next.run(req).await)
}
