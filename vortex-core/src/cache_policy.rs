//! Cache key and TTL policy.
//!
//! Keys are namespaced as `{prefix}_{key}`; an empty prefix falls back to
//! [`DEFAULT_CACHE_PREFIX`]. TTLs are clamped per declared query type.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::time::Duration;

/// Namespace used when no prefix is configured
pub const DEFAULT_CACHE_PREFIX: &str = "vortex_thorius";

/// Upper bound for conversation entries
pub const CONVERSATION_MAX_TTL: Duration = Duration::from_secs(15 * 60);

/// Lower bound for reference data
pub const REFERENCE_MIN_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Upper bound for analytics aggregates
pub const ANALYTICS_MAX_TTL: Duration = Duration::from_secs(5 * 60);

/// Default TTL when none is configured
pub const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60);

/// Declared kind of cached data
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryType {
    Conversation,
    Reference,
    Analytics,
    #[default]
    Default,
}

impl QueryType {
    pub fn parse_lenient(s: &str) -> Self {
        match s {
            "conversation" => QueryType::Conversation,
            "reference" => QueryType::Reference,
            "analytics" => QueryType::Analytics,
            _ => QueryType::Default,
        }
    }
}

/// Key + TTL policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachePolicy {
    prefix: String,
    default_ttl: Duration,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_PREFIX, DEFAULT_TTL)
    }
}

impl CachePolicy {
    pub fn new(prefix: impl Into<String>, default_ttl: Duration) -> Self {
        Self {
            prefix: prefix.into(),
            default_ttl,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// `{prefix}_{key}`, or `vortex_thorius_{key}` when the prefix is empty
    pub fn build_key(&self, key: &str) -> String {
        build_key(&self.prefix, key)
    }

    /// Effective TTL for `query_type`, starting from `requested` (or the default)
    pub fn ttl_for(&self, query_type: QueryType, requested: Option<Duration>) -> Duration {
        let base = requested.unwrap_or(self.default_ttl);
        match query_type {
            QueryType::Conversation => base.min(CONVERSATION_MAX_TTL),
            QueryType::Reference => base.max(REFERENCE_MIN_TTL),
            QueryType::Analytics => base.min(ANALYTICS_MAX_TTL),
            QueryType::Default => base,
        }
    }
}

/// Namespaced key
pub fn build_key(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        format!("{DEFAULT_CACHE_PREFIX}_{key}")
    } else {
        format!("{prefix}_{key}")
    }
}

/// Stable key for a parameterized query: `query_{sha256(json)}`
pub fn query_key(params: &serde_json::Value) -> String {
    let digest = Sha256::digest(params.to_string().as_bytes());
    format!("query_{}", hex::encode(digest))
}
