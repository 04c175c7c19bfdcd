//! Analytics Types

use super::common::{Period, SessionId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Client-reported action, before anonymization
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TrackEvent {
    pub user_id: UserId,
    pub session_id: SessionId,
    pub action_type: String,
    /// Opaque JSON payload
    pub action_data: serde_json::Value,
    pub page_url: String,
    pub referrer: String,
    /// Raw client IP; anonymized before it is written
    pub ip_address: String,
    pub user_agent: String,
}

/// Stored analytics row. `ip_address` is always anonymized.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsEvent {
    pub id: i64,
    pub user_id: UserId,
    pub session_id: SessionId,
    pub action_type: String,
    pub action_data: serde_json::Value,
    pub page_url: String,
    pub referrer: String,
    pub ip_address: String,
    pub user_agent: String,
    pub created_at: DateTime<Utc>,
}

/// Per-action aggregate
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionSummary {
    pub action_type: String,
    pub count: u64,
    pub first_occurrence: String,
    pub last_occurrence: String,
}

/// Events per calendar day (`YYYY-MM-DD`)
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayActivity {
    pub date: String,
    pub count: u64,
}

/// Events per hour of day (0..=23)
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HourActivity {
    pub hour: u32,
    pub count: u64,
}

/// Page with its hit count
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageActivity {
    pub page_url: String,
    pub count: u64,
}

/// Behaviour summary for one user over a period
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UserBehavior {
    pub user_id: UserId,
    pub period: Period,
    pub actions: Vec<ActionSummary>,
    pub total_actions: u64,
    pub unique_sessions: u64,
    /// First and last activity ever, independent of the period
    pub first_seen: Option<String>,
    pub last_seen: Option<String>,
    pub activity_by_day: Vec<DayActivity>,
    pub activity_by_hour: Vec<HourActivity>,
    pub most_active_page: Option<PageActivity>,
}

/// Headline counts for market trends
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverallStats {
    pub total_events: u64,
    pub unique_users: u64,
    pub unique_sessions: u64,
}

/// Count keyed by a label (action, search term, referrer)
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabeledCount {
    pub label: String,
    pub count: u64,
}

/// Distinct active users per day
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrowthPoint {
    pub date: String,
    pub users: u64,
}

/// Market-wide activity summary
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MarketTrends {
    pub period: Period,
    pub overall: OverallStats,
    pub popular_actions: Vec<LabeledCount>,
    pub user_growth: Vec<GrowthPoint>,
    pub search_terms: Vec<LabeledCount>,
    pub top_referrers: Vec<LabeledCount>,
}
