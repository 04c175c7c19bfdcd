//! Application State
//!
//! Shared state for the VORTEX API service.

use chrono::{DateTime, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use vortex_engine::{parse_flag, VortexEngine};

use crate::auth::AuthConfig;
use crate::insights::PlaceholderInsights;
use crate::metrics::{init_metrics, MetricsSummary};
use crate::nonce::NonceIssuer;
use crate::rate_limit::{RateLimitConfig, RateLimiter, DEFAULT_REQUESTS_PER_MINUTE};

/// Application configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Service name
    pub service_name: String,
    /// Service version
    pub version: String,
    /// Listen address
    pub listen_addr: String,
    /// `Access-Control-Allow-Origin`; `*` allows any origin
    pub cors_origin: String,
    /// Requests per minute per client; 0 disables limiting
    pub rate_limit_per_minute: u32,
    /// Nonce signing secret; random per process when unset
    pub nonce_secret: Option<String>,
    /// Install the Prometheus recorder and serve `/metrics`
    pub metrics_enabled: bool,
    /// Expose server error details in AJAX responses
    pub debug: bool,
    /// Max request body size (bytes)
    pub max_body_size: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            service_name: "vortex-api".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            listen_addr: "0.0.0.0:3000".to_string(),
            cors_origin: "*".to_string(),
            rate_limit_per_minute: DEFAULT_REQUESTS_PER_MINUTE,
            nonce_secret: None,
            metrics_enabled: true,
            debug: false,
            max_body_size: 1024 * 1024, // 1MB
        }
    }
}

impl ApiConfig {
    /// Create from environment variables
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        let rate_limit_per_minute = match get("VORTEX_API_RATE_LIMIT") {
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                tracing::warn!(value = %raw, "invalid VORTEX_API_RATE_LIMIT, using default");
                defaults.rate_limit_per_minute
            }),
            None => defaults.rate_limit_per_minute,
        };

        Self {
            listen_addr: get("VORTEX_LISTEN_ADDR").unwrap_or(defaults.listen_addr),
            cors_origin: get("VORTEX_CORS_ORIGIN").unwrap_or(defaults.cors_origin),
            rate_limit_per_minute,
            nonce_secret: get("VORTEX_NONCE_SECRET"),
            metrics_enabled: get("VORTEX_METRICS_ENABLED")
                .map(|v| parse_flag(&v))
                .unwrap_or(defaults.metrics_enabled),
            debug: get("VORTEX_DEBUG").map(|v| parse_flag(&v)).unwrap_or(false),
            ..Self::default()
        }
    }

    pub fn with_listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.listen_addr = addr.into();
        self
    }
}

/// Application state shared across handlers
pub struct AppState {
    /// Configuration
    pub config: ApiConfig,
    /// Authentication configuration
    pub auth_config: AuthConfig,
    /// Marketplace services
    pub engine: Arc<VortexEngine>,
    /// AJAX nonce issuer
    pub nonces: NonceIssuer,
    /// Per-client token buckets
    pub rate_limiter: RateLimiter,
    /// Placeholder AI and market numbers
    pub insights: PlaceholderInsights,
    /// Prometheus render handle, when metrics are enabled
    pub prometheus: Option<PrometheusHandle>,
    /// Service start time
    pub started_at: DateTime<Utc>,
    request_counter: AtomicU64,
}

impl AppState {
    /// Create new application state with default config
    pub fn new(engine: Arc<VortexEngine>) -> Self {
        Self::with_config(ApiConfig::default(), engine)
    }

    /// Create with configuration
    pub fn with_config(config: ApiConfig, engine: Arc<VortexEngine>) -> Self {
        let nonces = match &config.nonce_secret {
            Some(secret) => NonceIssuer::new(secret),
            None => {
                tracing::warn!("VORTEX_NONCE_SECRET not set, nonces will not survive a restart");
                NonceIssuer::random()
            }
        };
        let prometheus = if config.metrics_enabled {
            init_metrics()
        } else {
            None
        };
        Self {
            rate_limiter: RateLimiter::new(RateLimitConfig::per_minute(
                config.rate_limit_per_minute,
            )),
            config,
            auth_config: AuthConfig::default(),
            engine,
            nonces,
            insights: PlaceholderInsights::new(),
            prometheus,
            started_at: Utc::now(),
            request_counter: AtomicU64::new(0),
        }
    }

    /// Set authentication configuration
    pub fn with_auth(mut self, auth_config: AuthConfig) -> Self {
        if auth_config.api_keys.is_empty() {
            tracing::warn!("no API keys configured, SaaS endpoints will reject every request");
        }
        self.auth_config = auth_config;
        self
    }

    /// Either the API or the engine may turn on debug output
    pub fn debug(&self) -> bool {
        self.config.debug || self.engine.config().debug
    }

    pub fn uptime_secs(&self) -> u64 {
        (Utc::now() - self.started_at).num_seconds().max(0) as u64
    }

    pub fn increment_requests(&self) -> u64 {
        self.request_counter.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn metrics_summary(&self) -> MetricsSummary {
        MetricsSummary {
            total_requests: self.request_counter.load(Ordering::Relaxed),
            uptime_seconds: self.uptime_secs(),
            metrics_enabled: self.prometheus.is_some(),
        }
    }
}
