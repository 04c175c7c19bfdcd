//! VORTEX API - HTTP Interface Layer
//!
//! This crate serves the marketplace over HTTP: the AJAX actions used by the
//! storefront, the SaaS backend endpoints, and ops endpoints.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │                  VORTEX API                    │
//! │  rate limit → metrics → CORS → trace           │
//! │  ┌──────────────┐ ┌────────────┐ ┌──────────┐  │
//! │  │ AJAX actions │ │ SaaS (key) │ │   Ops    │  │
//! │  └──────────────┘ └────────────┘ └──────────┘  │
//! └───────────────────────────────────────────────┘
//!          │                │
//!          ▼                ▼
//!    vortex-engine    PlaceholderInsights
//! ```
//!
//! # Endpoints
//!
//! ## AJAX (nonce + `X-Vortex-User` / `X-Vortex-User-Token`)
//! - `POST /wp-admin/admin-ajax.php?action=<name>`
//! - `POST /api/v1/ajax/:action`
//! - `GET /api/v1/nonce?action=&user_id=` - Issue a nonce and user token (API key)
//!
//! ## SaaS backend (API key; also under `/api/v1`)
//! - `POST /ai/compute` - analyze_artwork, predict_market_trends, get_business_strategy
//! - `POST /analytics` - market_overview, artist_performance, sales_metrics, trend_analysis
//! - `GET /health` - Keyed health check
//! - `GET /market-predictions` - Category predictions
//! - `GET /market-predictions/asset/:id` - Asset prediction
//! - `GET /api/v1/thorius/trends?period=` - Market activity
//! - `GET /api/v1/thorius/users/:id/behavior?period=` - User behaviour
//!
//! ## Ops
//! - `GET /healthz` - Component health
//! - `GET /metrics` - Prometheus scrape
//!
//! # Usage Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use vortex_api::{start_server, ApiConfig, AppState, AuthConfig};
//! use vortex_engine::{EngineConfig, VortexEngine};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let engine = VortexEngine::bootstrap(EngineConfig::from_env()?).await?;
//!     let state = AppState::with_config(ApiConfig::from_env(), Arc::new(engine))
//!         .with_auth(AuthConfig::from_env());
//!     start_server(state).await?;
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod insights;
pub mod metrics;
pub mod nonce;
pub mod rate_limit;
pub mod routes;
pub mod state;

// Re-export main types
pub use auth::{AuthConfig, API_KEY_HEADER, USER_HEADER, USER_TOKEN_HEADER};
pub use dto::*;
pub use error::{AjaxResponse, ApiError, ApiResult, ErrorResponse};
pub use handlers::AjaxAction;
pub use insights::PlaceholderInsights;
pub use metrics::{init_metrics, MetricsSummary};
pub use nonce::NonceIssuer;
pub use rate_limit::{RateLimitConfig, RateLimiter};
pub use routes::{build_app, create_router};
pub use state::{ApiConfig, AppState};

use std::net::SocketAddr;
use std::time::Duration;

/// VORTEX API version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default API port
pub const DEFAULT_PORT: u16 = 3000;

/// Start the API server
pub async fn start_server(state: AppState) -> Result<(), std::io::Error> {
    let addr = state.config.listen_addr.clone();
    rate_limit::start_cleanup_task(state.rate_limiter.clone(), Duration::from_secs(300));
    let app = build_app(state);

    tracing::info!("Starting VORTEX API server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_api_config_defaults() {
        let config = ApiConfig::default();
        assert_eq!(config.listen_addr, format!("0.0.0.0:{DEFAULT_PORT}"));
        assert_eq!(config.cors_origin, "*");
        assert_eq!(config.max_body_size, 1024 * 1024);
    }

    #[test]
    fn test_ajax_actions_roundtrip() {
        for action in AjaxAction::ALL {
            assert_eq!(AjaxAction::parse(action.as_str()), Some(action));
        }
        assert_eq!(AjaxAction::parse("vortex_unknown"), None);
        assert!(!AjaxAction::TrackAnalytics.requires_login());
        assert!(AjaxAction::ProcessTransaction.requires_login());
    }
}
