//! Data Transfer Objects
//!
//! Response bodies shared by the SaaS and ops handlers, and reused by the
//! API client to decode them.

use serde::{Deserialize, Serialize};
use vortex_engine::EngineHealth;

use crate::metrics::MetricsSummary;

// ============================================
// Health
// ============================================

/// Service health
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// `healthy`, `degraded` or `unhealthy`
    pub status: String,
    /// Service name
    pub service: String,
    /// Version
    pub version: String,
    /// Uptime seconds
    pub uptime_secs: u64,
    /// Component health
    pub components: Vec<ComponentHealth>,
    /// Request counters
    pub total_requests: u64,
    pub metrics_enabled: bool,
}

/// Component health
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    /// Component name
    pub name: String,
    /// Status
    pub status: String,
    /// Message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ComponentHealth {
    fn new(name: impl Into<String>, status: &str, message: Option<String>) -> Self {
        Self {
            name: name.into(),
            status: status.to_string(),
            message,
        }
    }
}

impl HealthResponse {
    /// Database down is unhealthy; a missing cache or AI provider only degrades
    pub fn from_engine(
        service: &str,
        version: &str,
        health: &EngineHealth,
        summary: &MetricsSummary,
    ) -> Self {
        let mut components = Vec::with_capacity(2 + health.ai_providers.len());
        components.push(if health.database {
            ComponentHealth::new("database", "healthy", None)
        } else {
            ComponentHealth::new("database", "unhealthy", Some("query failed".to_string()))
        });

        components.push(match &health.cache {
            Some(stats) if stats.enabled => ComponentHealth::new(
                "cache",
                "healthy",
                Some(format!("{} hits, {} misses", stats.hits, stats.misses)),
            ),
            Some(_) => ComponentHealth::new("cache", "degraded", Some("disabled".to_string())),
            None => ComponentHealth::new("cache", "unhealthy", Some("unavailable".to_string())),
        });

        for (provider, configured) in &health.ai_providers {
            components.push(if *configured {
                ComponentHealth::new(format!("ai:{provider}"), "healthy", None)
            } else {
                ComponentHealth::new(
                    format!("ai:{provider}"),
                    "degraded",
                    Some("no API key configured".to_string()),
                )
            });
        }

        let status = if !health.is_healthy() {
            "unhealthy"
        } else if components.iter().all(|c| c.status == "healthy") {
            "healthy"
        } else {
            "degraded"
        };

        Self {
            status: status.to_string(),
            service: service.to_string(),
            version: version.to_string(),
            uptime_secs: summary.uptime_seconds,
            components,
            total_requests: summary.total_requests,
            metrics_enabled: summary.metrics_enabled,
        }
    }

    pub fn is_unhealthy(&self) -> bool {
        self.status == "unhealthy"
    }
}

// ============================================
// Nonces
// ============================================

/// Nonce issued for one AJAX action and user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NonceResponse {
    pub nonce: String,
    pub action: String,
    pub user_id: u64,
    /// Value for `X-Vortex-User-Token`; absent for anonymous visitors
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_token: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use vortex_engine::CacheStats;

    fn summary() -> MetricsSummary {
        MetricsSummary {
            total_requests: 3,
            uptime_seconds: 10,
            metrics_enabled: false,
        }
    }

    #[test]
    fn test_health_status_rollup() {
        let health = EngineHealth {
            database: true,
            cache: Some(CacheStats {
                enabled: true,
                hits: 1,
                misses: 2,
                entries: 1,
            }),
            ai_providers: vec![("openai", true)],
        };
        let response = HealthResponse::from_engine("vortex-api", "0.1.0", &health, &summary());
        assert_eq!(response.status, "healthy");
        assert_eq!(response.components.len(), 3);
        assert_eq!(response.total_requests, 3);

        let health = EngineHealth {
            ai_providers: vec![("openai", true), ("stability", false)],
            ..health
        };
        let response = HealthResponse::from_engine("vortex-api", "0.1.0", &health, &summary());
        assert_eq!(response.status, "degraded");
    }

    #[test]
    fn test_database_down_is_unhealthy() {
        let health = EngineHealth {
            database: false,
            cache: None,
            ai_providers: vec![],
        };
        let response = HealthResponse::from_engine("vortex-api", "0.1.0", &health, &summary());
        assert!(response.is_unhealthy());
    }
}
