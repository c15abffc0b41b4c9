//! Fixed-window request rate limiting.
//!
//! [`InMemoryRateLimiter`] keeps its counters in process memory, so limits
//! apply per server instance only. Deployments running several instances
//! should provide a [`RateLimiter`] backed by shared storage.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use actix_web::body::MessageBody;
use actix_web::dev::{ServiceRequest, ServiceResponse};
use actix_web::http::header::{HeaderName, HeaderValue};
use actix_web::middleware::Next;
use actix_web::{Error, HttpResponse, web};
use serde_json::json;

use crate::auth::API_KEY_HEADER;

/// Outcome of counting one request against its key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RateDecision {
    pub allowed: bool,
    pub remaining: u32,
    /// Time until the current window closes.
    pub reset_after: Duration,
}

pub trait RateLimiter: Send + Sync {
    fn check(&self, key: &str) -> RateDecision;
}

/// Shared limiter handle stored in app data.
pub type SharedRateLimiter = Arc<dyn RateLimiter>;

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

#[derive(Debug)]
struct State {
    windows: HashMap<String, Window>,
    last_prune: Instant,
}

#[derive(Debug)]
pub struct InMemoryRateLimiter {
    max_requests: u32,
    window: Duration,
    state: Mutex<State>,
}

impl InMemoryRateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            state: Mutex::new(State {
                windows: HashMap::new(),
                last_prune: Instant::now(),
            }),
        }
    }

    /// Counts a request for `key` as seen at `now`.
    pub fn check_at(&self, key: &str, now: Instant) -> RateDecision {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);

        if now.duration_since(state.last_prune) >= self.window {
            let window = self.window;
            state
                .windows
                .retain(|_, w| now.duration_since(w.started) < window);
            state.last_prune = now;
        }

        let entry = state.windows.entry(key.to_string()).or_insert(Window {
            started: now,
            count: 0,
        });
        if now.duration_since(entry.started) >= self.window {
            *entry = Window {
                started: now,
                count: 0,
            };
        }

        let reset_after = self.window.saturating_sub(now.duration_since(entry.started));
        if entry.count >= self.max_requests {
            return RateDecision {
                allowed: false,
                remaining: 0,
                reset_after,
            };
        }
        entry.count += 1;
        RateDecision {
            allowed: true,
            remaining: self.max_requests - entry.count,
            reset_after,
        }
    }

    /// Number of keys currently tracked.
    pub fn tracked_keys(&self) -> usize {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .windows
            .len()
    }
}

impl RateLimiter for InMemoryRateLimiter {
    fn check(&self, key: &str) -> RateDecision {
        self.check_at(key, Instant::now())
    }
}

/// Rate-limit key of a request: its API key when present, else the client IP.
fn request_key(req: &ServiceRequest) -> String {
    if let Some(key) = req
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
    {
        return format!("key:{key}");
    }
    let info = req.connection_info();
    format!("ip:{}", info.realip_remote_addr().unwrap_or("unknown"))
}

/// Middleware rejecting requests over the limit with `429 Too Many Requests`.
/// Passes everything through when no limiter is registered.
pub async fn rate_limit(
    req: ServiceRequest,
    next: Next<impl MessageBody + 'static>,
) -> Result<ServiceResponse<impl MessageBody>, Error> {
    let limiter = req.app_data::<web::Data<SharedRateLimiter>>().cloned();
    let Some(limiter) = limiter else {
        return next.call(req).await.map(ServiceResponse::map_into_left_body);
    };

    let key = request_key(&req);
    let decision = limiter.check(&key);
    if !decision.allowed {
        let retry_after = decision.reset_after.as_secs().max(1);
        log::info!("Rate limit exceeded for {key}");
        let response = HttpResponse::TooManyRequests()
            .insert_header(("Retry-After", retry_after.to_string()))
            .json(json!({ "error": "Too many requests, please try again later" }));
        return Ok(req.into_response(response).map_into_right_body());
    }

    let mut res = next.call(req).await?;
    res.headers_mut().insert(
        HeaderName::from_static("x-ratelimit-remaining"),
        HeaderValue::from(decision.remaining),
    );
    Ok(res.map_into_left_body())
}
