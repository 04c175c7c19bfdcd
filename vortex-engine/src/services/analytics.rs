//! Thorius Analytics Service

use chrono::{Duration, Utc};
use std::sync::Arc;
use tracing::{debug, info};
use vortex_core::{
    anonymize_ip, AnalyticsEvent, EventBus, MarketEvent, MarketTrends, Period, SessionId,
    TrackEvent, UserBehavior, UserId, VortexError,
};
use vortex_store::AnalyticsRepository;

use crate::error::EngineResult;

/// Longest action type accepted from clients
pub const MAX_ACTION_TYPE_LEN: usize = 50;

/// Analytics service
pub struct AnalyticsService {
    repo: Arc<dyn AnalyticsRepository>,
    events: Arc<EventBus>,
}

impl AnalyticsService {
    pub fn new(repo: Arc<dyn AnalyticsRepository>, events: Arc<EventBus>) -> Self {
        Self { repo, events }
    }

    /// Record one client-reported action; the IP is anonymized before the write
    pub async fn track_event(&self, mut event: TrackEvent) -> EngineResult<i64> {
        event.action_type = event.action_type.trim().to_string();
        if event.action_type.is_empty() {
            return Err(VortexError::missing("action_type").into());
        }
        if event.action_type.chars().count() > MAX_ACTION_TYPE_LEN {
            return Err(VortexError::invalid(
                "action_type",
                format!("longer than {MAX_ACTION_TYPE_LEN} characters"),
            )
            .into());
        }
        if event.session_id.as_str().is_empty() {
            event.session_id = SessionId::generate();
        }
        event.ip_address = anonymize_ip(&event.ip_address);

        let user_id = event.user_id;
        let action_type = event.action_type.clone();
        let now = Utc::now();
        let id = self.repo.insert(event, now).await?;

        debug!(id, user_id = %user_id, action_type = %action_type, "analytics event tracked");
        self.events.publish(&MarketEvent::AnalyticsTracked {
            user_id,
            action_type,
            timestamp: now,
        });
        Ok(id)
    }

    pub async fn get_user_behavior(
        &self,
        user_id: UserId,
        period: Period,
    ) -> EngineResult<UserBehavior> {
        Ok(self
            .repo
            .user_behavior(user_id, period, period.cutoff(Utc::now()))
            .await?)
    }

    /// Site-wide trends; anonymous visitors are excluded
    pub async fn get_market_trends(&self, period: Period) -> EngineResult<MarketTrends> {
        Ok(self
            .repo
            .market_trends(period, period.cutoff(Utc::now()))
            .await?)
    }

    pub async fn recent_events(
        &self,
        user_id: UserId,
        limit: usize,
    ) -> EngineResult<Vec<AnalyticsEvent>> {
        Ok(self.repo.recent_for_user(user_id, limit.max(1)).await?)
    }

    /// Delete rows older than `days` days; returns how many were removed
    pub async fn cleanup_older_than(&self, days: u32) -> EngineResult<usize> {
        if days == 0 {
            return Err(VortexError::invalid("days", "must be at least 1").into());
        }
        let cutoff = Utc::now() - Duration::days(i64::from(days));
        let deleted = self.repo.delete_before(cutoff).await?;
        info!(days, deleted, "old analytics rows removed");
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use vortex_store::VortexDatabase;

    async fn service() -> AnalyticsService {
        let db = VortexDatabase::in_memory().unwrap();
        db.init_schema().await.unwrap();
        AnalyticsService::new(db.analytics.clone(), Arc::new(EventBus::new()))
    }

    fn event(user: u64, action: &str, ip: &str) -> TrackEvent {
        TrackEvent {
            user_id: UserId(user),
            session_id: SessionId::new("sess-1"),
            action_type: action.into(),
            action_data: json!({}),
            page_url: "https://market.example.com/gallery".into(),
            referrer: String::new(),
            ip_address: ip.into(),
            user_agent: "test-agent".into(),
        }
    }

    #[tokio::test]
    async fn test_track_anonymizes_ip() {
        let service = service().await;
        service.track_event(event(5, "view_artwork", "192.168.1.77")).await.unwrap();
        service
            .track_event(event(5, "view_artwork", "2001:db8::8a2e:370:7334"))
            .await
            .unwrap();
        service.track_event(event(5, "view_artwork", "not-an-ip")).await.unwrap();

        let stored = service.recent_events(UserId(5), 10).await.unwrap();
        let ips: Vec<&str> = stored.iter().map(|e| e.ip_address.as_str()).collect();
        assert_eq!(ips, vec!["", "2001:db8::8a2e:370:0000", "192.168.1.0"]);
    }

    #[tokio::test]
    async fn test_track_rejects_empty_action() {
        let service = service().await;
        let err = service.track_event(event(5, "  ", "10.0.0.1")).await.unwrap_err();
        assert_eq!(err.code(), "input_error");
        assert!(service.recent_events(UserId(5), 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_track_fills_missing_session() {
        let service = service().await;
        let mut anonymous = event(0, "search", "10.0.0.1");
        anonymous.session_id = SessionId::new("");
        service.track_event(anonymous).await.unwrap();

        let stored = service.recent_events(UserId::ANONYMOUS, 1).await.unwrap();
        assert_eq!(stored[0].session_id.as_str().len(), 36);
    }

    #[tokio::test]
    async fn test_behavior_and_trends() {
        let service = service().await;
        service.track_event(event(5, "view_artwork", "10.0.0.1")).await.unwrap();
        service.track_event(event(5, "view_artwork", "10.0.0.1")).await.unwrap();
        service.track_event(event(5, "purchase", "10.0.0.1")).await.unwrap();
        service.track_event(event(0, "view_artwork", "10.0.0.2")).await.unwrap();

        let behavior = service.get_user_behavior(UserId(5), Period::Week).await.unwrap();
        assert_eq!(behavior.total_actions, 3);
        assert_eq!(behavior.actions[0].action_type, "view_artwork");
        assert_eq!(behavior.actions[0].count, 2);

        let trends = service.get_market_trends(Period::All).await.unwrap();
        assert_eq!(trends.overall.total_events, 3);
        assert_eq!(trends.overall.unique_users, 1);
    }

    #[tokio::test]
    async fn test_cleanup_keeps_recent_rows() {
        let service = service().await;
        service.track_event(event(5, "view_artwork", "10.0.0.1")).await.unwrap();
        assert_eq!(service.cleanup_older_than(30).await.unwrap(), 0);
        assert_eq!(service.cleanup_older_than(0).await.unwrap_err().code(), "input_error");
        assert_eq!(service.recent_events(UserId(5), 10).await.unwrap().len(), 1);
    }
}
