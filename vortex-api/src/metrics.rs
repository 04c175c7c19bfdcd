//! Prometheus Metrics
//!
//! # Metrics
//!
//! ## Counters
//! - `vortex_http_requests_total` - HTTP requests by method, path, status
//! - `vortex_errors_total` - Errors by stable code
//! - `vortex_transactions_total` - Recorded by the transaction service
//! - `vortex_cache_hits_total` / `vortex_cache_misses_total` - Recorded by the cache service
//!
//! ## Histograms
//! - `vortex_http_request_duration_seconds` - HTTP request duration
//!
//! ## Gauges
//! - `vortex_uptime_seconds` - Service uptime
//!
//! Enabled unless `VORTEX_METRICS_ENABLED=false`; rendered at `GET /metrics`.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;
use std::sync::Arc;
use std::time::Instant;

use crate::state::AppState;

static PROMETHEUS: OnceCell<PrometheusHandle> = OnceCell::new();

/// Install the Prometheus recorder
///
/// The recorder is process-global; later calls return the first handle.
/// Returns `None` when another recorder is already installed.
pub fn init_metrics() -> Option<PrometheusHandle> {
    let handle = PROMETHEUS.get_or_try_init(|| {
        PrometheusBuilder::new().install_recorder().map(|handle| {
            tracing::info!("Prometheus metrics recorder installed");
            handle
        })
    });
    match handle {
        Ok(handle) => Some(handle.clone()),
        Err(e) => {
            tracing::warn!(error = %e, "Metrics recorder unavailable");
            None
        }
    }
}

/// Record a request metric
pub fn record_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let labels = [
        ("method", method.to_string()),
        ("path", normalize_path(path)),
        ("status", status.to_string()),
    ];

    counter!("vortex_http_requests_total", &labels).increment(1);
    histogram!("vortex_http_request_duration_seconds", &labels).record(duration_secs);
}

/// Record an error by its stable code
pub fn record_error(code: &'static str) {
    counter!("vortex_errors_total", "code" => code).increment(1);
}

fn set_uptime(seconds: u64) {
    gauge!("vortex_uptime_seconds").set(seconds as f64);
}

/// Collapse numeric and uuid segments so label cardinality stays bounded
fn normalize_path(path: &str) -> String {
    let normalized = path
        .split('/')
        .map(|part| {
            let numeric = !part.is_empty() && part.chars().all(|c| c.is_ascii_digit());
            let uuid_like =
                part.len() >= 16 && part.chars().all(|c| c.is_ascii_hexdigit() || c == '-');
            if numeric || uuid_like {
                ":id"
            } else {
                part
            }
        })
        .collect::<Vec<_>>()
        .join("/");

    match normalized.char_indices().nth(64) {
        Some((idx, _)) => normalized[..idx].to_string(),
        None => normalized,
    }
}

/// Metrics middleware for tracking HTTP requests
pub async fn metrics_middleware(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let path = request.uri().path().to_string();

    state.increment_requests();
    set_uptime(state.uptime_secs());

    let response = next.run(request).await;

    record_request(
        &method,
        &path,
        response.status().as_u16(),
        start.elapsed().as_secs_f64(),
    );
    response
}

/// Request counters for the health response
#[derive(Debug, Clone, serde::Serialize)]
pub struct MetricsSummary {
    pub total_requests: u64,
    pub uptime_seconds: u64,
    pub metrics_enabled: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("/api/v1/health"), "/api/v1/health");
        assert_eq!(
            normalize_path("/api/v1/thorius/users/42/behavior"),
            "/api/v1/thorius/users/:id/behavior"
        );
        assert_eq!(
            normalize_path("/market-predictions/asset/550e8400-e29b-41d4-a716-446655440000"),
            "/market-predictions/asset/:id"
        );
        assert_eq!(normalize_path("/wp-admin/admin-ajax.php"), "/wp-admin/admin-ajax.php");
    }

    #[test]
    fn test_normalize_path_truncates() {
        let long = format!("/{}", "a".repeat(200));
        assert_eq!(normalize_path(&long).chars().count(), 64);
    }

    #[test]
    fn test_init_metrics_is_idempotent() {
        let first = init_metrics();
        let second = init_metrics();
        assert_eq!(first.is_some(), second.is_some());
    }
}
