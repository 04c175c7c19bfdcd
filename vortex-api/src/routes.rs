//! API Routes
//!
//! Route definitions for the VORTEX API.

use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers::*;
use crate::metrics::metrics_middleware;
use crate::rate_limit::rate_limit_middleware;
use crate::state::AppState;

/// SaaS backend routes; mounted at the root and under `/api/v1`
fn saas_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ai/compute", post(compute))
        .route("/analytics", post(analytics))
        .route("/health", get(health))
        .route("/market-predictions", get(market_predictions))
        .route("/market-predictions/asset/:asset_id", get(asset_prediction))
}

/// Create the `/api/v1` router
pub fn create_router(state: Arc<AppState>) -> Router {
    saas_routes()
        // AJAX actions
        .route("/ajax/:action", post(ajax_action))
        .route("/nonce", get(issue_nonce))
        // Thorius analytics reads
        .route("/thorius/trends", get(thorius_trends))
        .route("/thorius/users/:user_id/behavior", get(thorius_user_behavior))
        .with_state(state)
}

fn cors_layer(origin: &str) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);
    if origin == "*" {
        return layer.allow_origin(Any);
    }
    match HeaderValue::from_str(origin) {
        Ok(value) => layer.allow_origin(AllowOrigin::exact(value)),
        Err(_) => {
            tracing::warn!(origin, "invalid VORTEX_CORS_ORIGIN, cross-origin requests disabled");
            layer
        }
    }
}

/// Build the full application router
pub fn build_app(state: AppState) -> Router {
    let state = Arc::new(state);

    let root_router = Router::new()
        .route("/", get(|| async { "VORTEX API Service" }))
        .route("/healthz", get(healthz))
        .route("/metrics", get(prometheus_metrics))
        .route("/wp-admin/admin-ajax.php", post(admin_ajax))
        .merge(saas_routes())
        .with_state(state.clone());

    root_router
        .nest("/api/v1", create_router(state.clone()))
        .layer(middleware::from_fn_with_state(state.clone(), rate_limit_middleware))
        .layer(middleware::from_fn_with_state(state.clone(), metrics_middleware))
        .layer(DefaultBodyLimit::max(state.config.max_body_size))
        .layer(cors_layer(&state.config.cors_origin))
        .layer(TraceLayer::new_for_http())
}
