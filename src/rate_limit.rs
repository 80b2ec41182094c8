use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use tracing::warn;

use crate::{error::ApiError, state::AppState};

/// Per-operation request budget over a trailing window.
#[derive(Debug, Clone, Copy)]
pub struct Quota {
    pub max_requests: usize,
    pub window_secs: u64,
}

impl Quota {
    pub const fn new(max_requests: usize, window_secs: u64) -> Self {
        Self {
            max_requests,
            window_secs,
        }
    }
}

/// Sliding-window rate limiter keyed by `operation:client_id`.
///
/// Timestamps are kept per key and pruned lazily on the next access to that
/// key. State is process-local; counters reset on restart and are not shared
/// across instances.
#[derive(Debug, Default)]
pub struct RateLimiter {
    buckets: Mutex<HashMap<String, Vec<Instant>>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allows the request and records it, or denies with a suggested
    /// retry-after (seconds). Denied attempts are not recorded, so a client
    /// hammering a throttled operation does not push its window forward.
    pub fn check_and_record(
        &self,
        operation: &str,
        client_id: &str,
        quota: Quota,
    ) -> Result<(), u64> {
        self.check_and_record_at(operation, client_id, quota, Instant::now())
    }

    fn check_and_record_at(
        &self,
        operation: &str,
        client_id: &str,
        quota: Quota,
        now: Instant,
    ) -> Result<(), u64> {
        let window = Duration::from_secs(quota.window_secs);
        let mut buckets = self.buckets.lock().unwrap_or_else(|e| e.into_inner());
        let entries = buckets.entry(format!("{operation}:{client_id}")).or_default();

        entries.retain(|seen| now.saturating_duration_since(*seen) < window);
        if entries.len() >= quota.max_requests {
            return Err(quota.window_secs);
        }
        entries.push(now);
        Ok(())
    }
}

/// Route-level throttle state: which operation a route counts against and
/// the quota it gets. Attached per route with
/// `middleware::from_fn_with_state`, so every route's throttle is declared
/// where the route is, and routes without one are simply not throttled.
#[derive(Clone)]
pub struct Throttle {
    limiter: std::sync::Arc<RateLimiter>,
    operation: &'static str,
    quota: Quota,
}

impl Throttle {
    pub fn new(state: &AppState, operation: &'static str, quota: Quota) -> Self {
        Self {
            limiter: state.limiter.clone(),
            operation,
            quota,
        }
    }
}

pub async fn throttle(
    State(t): State<Throttle>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let client = client_id(request.headers());
    if let Err(retry_after_secs) = t.limiter.check_and_record(t.operation, &client, t.quota) {
        warn!(operation = t.operation, client = %client, "rate limit exceeded");
        return Err(ApiError::RateLimited { retry_after_secs });
    }
    Ok(next.run(request).await)
}

/// Client identity for throttling: first hop of `X-Forwarded-For`, then
/// `X-Real-IP`, then a shared `"unknown"` bucket. Un-attributable clients
/// therefore throttle each other.
pub fn client_id(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|v| v.to_str().ok())
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        })
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUOTA: Quota = Quota::new(3, 300);

    #[test]
    fn allows_up_to_quota_then_denies() {
        let limiter = RateLimiter::new();
        for _ in 0..3 {
            assert!(limiter.check_and_record("login", "1.2.3.4", QUOTA).is_ok());
        }
        assert_eq!(
            limiter.check_and_record("login", "1.2.3.4", QUOTA),
            Err(300)
        );
    }

    #[test]
    fn window_slides_past_oldest_entry() {
        let limiter = RateLimiter::new();
        let start = Instant::now();
        for _ in 0..3 {
            assert!(limiter
                .check_and_record_at("login", "1.2.3.4", QUOTA, start)
                .is_ok());
        }
        assert!(limiter
            .check_and_record_at("login", "1.2.3.4", QUOTA, start)
            .is_err());

        // One second past the window the oldest entries fall out.
        let later = start + Duration::from_secs(301);
        assert!(limiter
            .check_and_record_at("login", "1.2.3.4", QUOTA, later)
            .is_ok());
    }

    #[test]
    fn denied_attempts_are_not_recorded() {
        let limiter = RateLimiter::new();
        let start = Instant::now();
        for _ in 0..3 {
            limiter
                .check_and_record_at("login", "1.2.3.4", QUOTA, start)
                .unwrap();
        }
        // Hammer while throttled; the window must still open on schedule.
        for i in 1..=10 {
            let at = start + Duration::from_secs(i * 10);
            assert!(limiter
                .check_and_record_at("login", "1.2.3.4", QUOTA, at)
                .is_err());
        }
        let past_window = start + Duration::from_secs(301);
        assert!(limiter
            .check_and_record_at("login", "1.2.3.4", QUOTA, past_window)
            .is_ok());
    }

    #[test]
    fn keys_are_isolated_by_client_and_operation() {
        let limiter = RateLimiter::new();
        for _ in 0..3 {
            limiter.check_and_record("login", "1.2.3.4", QUOTA).unwrap();
        }
        assert!(limiter.check_and_record("login", "1.2.3.4", QUOTA).is_err());
        assert!(limiter.check_and_record("login", "5.6.7.8", QUOTA).is_ok());
        assert!(limiter
            .check_and_record("register", "1.2.3.4", QUOTA)
            .is_ok());
    }

    #[test]
    fn client_id_prefers_forwarded_for() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "203.0.113.9, 10.0.0.1".parse().unwrap());
        headers.insert("x-real-ip", "198.51.100.2".parse().unwrap());
        assert_eq!(client_id(&headers), "203.0.113.9");

        headers.remove("x-forwarded-for");
        assert_eq!(client_id(&headers), "198.51.100.2");

        headers.remove("x-real-ip");
        assert_eq!(client_id(&headers), "unknown");
    }
}
