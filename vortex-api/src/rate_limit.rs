//! Rate Limiting Middleware
//!
//! Token bucket per client. The client is the API key when it is an accepted
//! key, else the authenticated user, else the peer IP. Unverified headers
//! never pick the bucket. Buckets hold `VORTEX_API_RATE_LIMIT` tokens and
//! refill at that many per minute.

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use crate::auth::{current_user, AuthConfig, API_KEY_HEADER};
use crate::nonce::NonceIssuer;
use crate::metrics::record_error;
use crate::state::AppState;

/// Default requests per minute per client
pub const DEFAULT_REQUESTS_PER_MINUTE: u32 = 60;

/// Rate limit configuration
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Requests per window; 0 disables limiting
    pub max_requests: u32,
    /// Window duration
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self::per_minute(DEFAULT_REQUESTS_PER_MINUTE)
    }
}

impl RateLimitConfig {
    pub fn per_minute(max_requests: u32) -> Self {
        Self {
            max_requests,
            window: Duration::from_secs(60),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.max_requests > 0
    }
}

#[derive(Debug)]
struct TokenBucket {
    tokens: f64,
    last_refill: Instant,
    max_tokens: f64,
    /// Tokens per second
    refill_rate: f64,
}

impl TokenBucket {
    fn new(max_tokens: u32, refill_rate: f64) -> Self {
        Self {
            tokens: max_tokens as f64,
            last_refill: Instant::now(),
            max_tokens: max_tokens as f64,
            refill_rate,
        }
    }

    fn try_consume(&mut self) -> bool {
        self.refill();
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    fn refill(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.refill_rate).min(self.max_tokens);
        self.last_refill = now;
    }

    fn remaining(&self) -> u32 {
        self.tokens as u32
    }

    fn retry_after(&self) -> Duration {
        if self.tokens >= 1.0 {
            Duration::ZERO
        } else {
            Duration::from_secs_f64((1.0 - self.tokens) / self.refill_rate)
        }
    }
}

/// Outcome of one bucket check
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateDecision {
    pub allowed: bool,
    pub remaining: u32,
    pub retry_after: Duration,
}

/// Rate limiter state
#[derive(Clone)]
pub struct RateLimiter {
    config: Arc<RateLimitConfig>,
    buckets: Arc<RwLock<HashMap<String, TokenBucket>>>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config: Arc::new(config),
            buckets: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Consume one token from the client's bucket
    pub async fn check(&self, key: &str) -> RateDecision {
        let refill_rate = self.config.max_requests as f64 / self.config.window.as_secs_f64();
        let mut buckets = self.buckets.write().await;
        let bucket = buckets
            .entry(key.to_string())
            .or_insert_with(|| TokenBucket::new(self.config.max_requests, refill_rate));

        let allowed = bucket.try_consume();
        RateDecision {
            allowed,
            remaining: bucket.remaining(),
            retry_after: bucket.retry_after(),
        }
    }

    /// Drop buckets idle for two windows
    pub async fn cleanup(&self) {
        let mut buckets = self.buckets.write().await;
        let Some(expiry) = Instant::now().checked_sub(self.config.window * 2) else {
            return;
        };
        buckets.retain(|_, bucket| bucket.last_refill > expiry);
    }

    pub async fn tracked_clients(&self) -> usize {
        self.buckets.read().await.len()
    }
}

/// Bucket key for a request; accepted keys are named by position
fn client_key(
    request: &Request,
    peer: Option<SocketAddr>,
    auth: &AuthConfig,
    nonces: &NonceIssuer,
) -> String {
    if let Some(index) = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .and_then(|k| auth.key_index(k))
    {
        return format!("key:{index}");
    }
    let user = current_user(request.headers(), nonces);
    if !user.is_anonymous() {
        return format!("user:{user}");
    }
    match peer {
        Some(addr) => format!("ip:{}", addr.ip()),
        None => "global".to_string(),
    }
}

/// 429 response
#[derive(Debug)]
pub struct RateLimitError {
    pub retry_after: Duration,
    pub limit: u32,
}

impl IntoResponse for RateLimitError {
    fn into_response(self) -> Response {
        record_error("rate_limited");
        // Whole seconds, rounded up
        let retry_secs = self.retry_after.as_secs() + u64::from(self.retry_after.subsec_nanos() > 0);
        let body = serde_json::json!({
            "error": "Rate limit exceeded",
            "retry_after_seconds": retry_secs,
        });

        let mut response = (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();
        let headers = response.headers_mut();
        headers.insert("X-RateLimit-Limit", HeaderValue::from(self.limit));
        headers.insert("X-RateLimit-Remaining", HeaderValue::from(0u32));
        headers.insert("Retry-After", HeaderValue::from(retry_secs));
        response
    }
}

/// Rate limit middleware
pub async fn rate_limit_middleware(
    State(state): State<Arc<AppState>>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    request: Request,
    next: Next,
) -> Result<Response, RateLimitError> {
    let limiter = &state.rate_limiter;
    if !limiter.config().is_enabled() {
        return Ok(next.run(request).await);
    }

    let key = client_key(
        &request,
        connect_info.map(|ci| ci.0),
        &state.auth_config,
        &state.nonces,
    );
    let decision = limiter.check(&key).await;
    if !decision.allowed {
        tracing::warn!(client = %key, "rate limit exceeded");
        return Err(RateLimitError {
            retry_after: decision.retry_after,
            limit: limiter.config().max_requests,
        });
    }

    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.insert(
        "X-RateLimit-Limit",
        HeaderValue::from(limiter.config().max_requests),
    );
    headers.insert("X-RateLimit-Remaining", HeaderValue::from(decision.remaining));
    Ok(response)
}

/// Start background cleanup task
pub fn start_cleanup_task(limiter: RateLimiter, interval: Duration) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(interval);
        loop {
            interval.tick().await;
            limiter.cleanup().await;
        }
    });
}
