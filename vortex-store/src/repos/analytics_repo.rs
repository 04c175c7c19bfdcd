//! Thorius Analytics and Cache Repositories

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use vortex_core::{AnalyticsEvent, MarketTrends, Period, TrackEvent, UserBehavior, UserId};

use crate::error::StoreResult;

/// Analytics repository trait
#[async_trait]
pub trait AnalyticsRepository: Send + Sync {
    /// Insert one event. The caller anonymizes the IP first.
    async fn insert(&self, event: TrackEvent, created_at: DateTime<Utc>) -> StoreResult<i64>;

    /// Recent events for a user, newest first
    async fn recent_for_user(&self, user_id: UserId, limit: usize)
        -> StoreResult<Vec<AnalyticsEvent>>;

    /// Behaviour aggregates for `user_id` since `cutoff` (all time when `None`)
    async fn user_behavior(
        &self,
        user_id: UserId,
        period: Period,
        cutoff: Option<DateTime<Utc>>,
    ) -> StoreResult<UserBehavior>;

    /// Market-wide aggregates since `cutoff`; anonymous rows are excluded
    async fn market_trends(
        &self,
        period: Period,
        cutoff: Option<DateTime<Utc>>,
    ) -> StoreResult<MarketTrends>;

    /// Delete rows created before `cutoff`; returns the number deleted
    async fn delete_before(&self, cutoff: DateTime<Utc>) -> StoreResult<usize>;
}

/// Key/value cache repository trait. Expiry is enforced on read.
#[async_trait]
pub trait CacheRepository: Send + Sync {
    /// Value for `key` if it has not expired at `now`
    async fn get(&self, key: &str, now: DateTime<Utc>) -> StoreResult<Option<String>>;

    /// Insert or overwrite
    async fn set(&self, key: &str, value: &str, expires_at: DateTime<Utc>) -> StoreResult<()>;

    /// Delete one key; returns whether it existed
    async fn delete(&self, key: &str) -> StoreResult<bool>;

    /// Delete every key starting with `prefix`; returns the number deleted
    async fn delete_prefix(&self, prefix: &str) -> StoreResult<usize>;

    /// Delete expired rows; returns the number deleted
    async fn purge_expired(&self, now: DateTime<Utc>) -> StoreResult<usize>;

    /// Number of stored entries, expired or not
    async fn count(&self) -> StoreResult<u64>;
}
