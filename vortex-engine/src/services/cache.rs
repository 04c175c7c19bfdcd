//! Thorius Cache Service
//!
//! Typed get/set over the cache table. Keys are namespaced with the
//! configured prefix and TTLs are clamped by query type. A miss, an expired
//! entry and an undecodable entry all look the same to callers: `None`.

use chrono::Utc;
use metrics::counter;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use vortex_core::{CachePolicy, QueryType};
use vortex_store::CacheRepository;

use crate::config::CacheConfig;
use crate::error::EngineResult;

/// Hit/miss counters plus the stored entry count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub enabled: bool,
    pub hits: u64,
    pub misses: u64,
    pub entries: u64,
}

/// Cache service
pub struct CacheService {
    repo: Arc<dyn CacheRepository>,
    policy: CachePolicy,
    enabled: bool,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl CacheService {
    pub fn new(repo: Arc<dyn CacheRepository>, config: &CacheConfig) -> Self {
        Self {
            repo,
            policy: config.policy(),
            enabled: config.enabled,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn policy(&self) -> &CachePolicy {
        &self.policy
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
        counter!("vortex_cache_hits_total").increment(1);
    }

    fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
        counter!("vortex_cache_misses_total").increment(1);
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        if !self.enabled {
            self.record_miss();
            return None;
        }
        let full_key = self.policy.build_key(key);

        let raw = match self.repo.get(&full_key, Utc::now()).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                self.record_miss();
                return None;
            }
            Err(e) => {
                warn!(key = %full_key, error = %e, "cache read failed");
                self.record_miss();
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => {
                self.record_hit();
                Some(value)
            }
            Err(e) => {
                warn!(key = %full_key, error = %e, "cache entry could not be decoded");
                self.record_miss();
                None
            }
        }
    }

    /// Store a value; `ttl` is clamped by `query_type`
    pub async fn set<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        ttl: Option<Duration>,
        query_type: QueryType,
    ) -> bool {
        if !self.enabled {
            return false;
        }
        let full_key = self.policy.build_key(key);
        let ttl = self.policy.ttl_for(query_type, ttl);

        let now = Utc::now();
        let Some(expires_at) = chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|d| now.checked_add_signed(d))
        else {
            warn!(key = %full_key, ?ttl, "cache TTL out of range");
            return false;
        };

        let encoded = match serde_json::to_string(value) {
            Ok(encoded) => encoded,
            Err(e) => {
                warn!(key = %full_key, error = %e, "cache value could not be encoded");
                return false;
            }
        };

        match self.repo.set(&full_key, &encoded, expires_at).await {
            Ok(()) => {
                debug!(key = %full_key, ttl_secs = ttl.as_secs(), "cache entry stored");
                true
            }
            Err(e) => {
                warn!(key = %full_key, error = %e, "cache write failed");
                false
            }
        }
    }

    pub async fn delete(&self, key: &str) -> bool {
        if !self.enabled {
            return false;
        }
        let full_key = self.policy.build_key(key);
        match self.repo.delete(&full_key).await {
            Ok(deleted) => deleted,
            Err(e) => {
                warn!(key = %full_key, error = %e, "cache delete failed");
                false
            }
        }
    }

    /// Delete every entry under `{prefix}_`
    ///
    /// An empty prefix is refused so unprefixed entries are never wiped.
    pub async fn clear(&self, prefix: &str) -> bool {
        if prefix.is_empty() {
            return false;
        }
        match self.repo.delete_prefix(&format!("{prefix}_")).await {
            Ok(deleted) => {
                info!(prefix, deleted, "cache cleared");
                true
            }
            Err(e) => {
                warn!(prefix, error = %e, "cache clear failed");
                false
            }
        }
    }

    /// Return the cached value, or compute, store and return it
    ///
    /// Loader errors are returned as-is and nothing is stored.
    pub async fn remember<T, F, Fut>(
        &self,
        key: &str,
        ttl: Option<Duration>,
        query_type: QueryType,
        loader: F,
    ) -> EngineResult<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = EngineResult<T>>,
    {
        if let Some(cached) = self.get(key).await {
            return Ok(cached);
        }
        let value = loader().await?;
        self.set(key, &value, ttl, query_type).await;
        Ok(value)
    }

    /// Remove expired rows; the cron substitute
    pub async fn purge_expired(&self) -> EngineResult<usize> {
        let purged = self.repo.purge_expired(Utc::now()).await?;
        if purged > 0 {
            info!(purged, "expired cache entries purged");
        }
        Ok(purged)
    }

    pub async fn stats(&self) -> EngineResult<CacheStats> {
        Ok(CacheStats {
            enabled: self.enabled,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.repo.count().await?,
        })
    }
}
