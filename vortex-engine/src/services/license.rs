//! License Manager
//!
//! Local activation records only; no license server is contacted.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use vortex_core::{
    default_features, is_valid_license_format, EventBus, LicenseRecord, LicenseStatus,
    MarketEvent, VortexError,
};
use vortex_store::{LicenseActivation, LicenseRepository};

use crate::error::EngineResult;

/// Activation lifetime
pub const LICENSE_TERM_DAYS: i64 = 365;

/// License state as shown to site admins; the key is masked
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LicenseSummary {
    pub status: LicenseStatus,
    pub license_key: Option<String>,
    pub site_url: Option<String>,
    pub expiration_date: Option<DateTime<Utc>>,
    pub expired: bool,
    pub features: serde_json::Value,
}

impl LicenseSummary {
    fn from_record(record: &LicenseRecord, now: DateTime<Utc>) -> Self {
        Self {
            status: record.status,
            license_key: Some(record.masked_key()),
            site_url: Some(record.site_url.clone()),
            expiration_date: Some(record.expiration_date),
            expired: record.expiration_date <= now,
            features: record.features.clone(),
        }
    }

    fn unlicensed() -> Self {
        Self {
            status: LicenseStatus::Inactive,
            license_key: None,
            site_url: None,
            expiration_date: None,
            expired: false,
            features: serde_json::json!({}),
        }
    }
}

/// License manager
pub struct LicenseManager {
    repo: Arc<dyn LicenseRepository>,
    site_url: String,
    events: Arc<EventBus>,
}

impl LicenseManager {
    pub fn new(
        repo: Arc<dyn LicenseRepository>,
        site_url: impl Into<String>,
        events: Arc<EventBus>,
    ) -> Self {
        Self {
            repo,
            site_url: site_url.into(),
            events,
        }
    }

    pub async fn activate_license(&self, license_key: &str) -> EngineResult<LicenseSummary> {
        let license_key = license_key.trim();
        if license_key.is_empty() {
            return Err(VortexError::missing("license_key").into());
        }
        if !is_valid_license_format(license_key) {
            return Err(VortexError::InvalidLicenseFormat.into());
        }

        let now = Utc::now();
        let record = self
            .repo
            .upsert_active(LicenseActivation {
                license_key: license_key.to_string(),
                site_url: self.site_url.clone(),
                expiration_date: now + Duration::days(LICENSE_TERM_DAYS),
                activated_at: now,
                features: default_features(),
            })
            .await?;

        info!(license = %record.masked_key(), "license activated");
        self.publish(LicenseStatus::Active, now);
        Ok(LicenseSummary::from_record(&record, now))
    }

    pub async fn deactivate_license(&self) -> EngineResult<LicenseSummary> {
        let current = self.repo.current().await?.ok_or(VortexError::LicenseNotFound)?;
        let now = Utc::now();
        self.repo
            .set_status(&current.license_key, LicenseStatus::Inactive, now)
            .await?;

        info!(license = %current.masked_key(), "license deactivated");
        self.publish(LicenseStatus::Inactive, now);

        let mut summary = LicenseSummary::from_record(&current, now);
        summary.status = LicenseStatus::Inactive;
        Ok(summary)
    }

    pub async fn license_status(&self) -> EngineResult<LicenseSummary> {
        let now = Utc::now();
        Ok(match self.repo.current().await? {
            Some(record) => LicenseSummary::from_record(&record, now),
            None => LicenseSummary::unlicensed(),
        })
    }

    fn publish(&self, status: LicenseStatus, timestamp: DateTime<Utc>) {
        self.events.publish(&MarketEvent::LicenseChanged {
            status: status.as_str().to_string(),
            timestamp,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vortex_store::VortexDatabase;

    async fn manager() -> LicenseManager {
        let db = VortexDatabase::in_memory().unwrap();
        db.init_schema().await.unwrap();
        LicenseManager::new(
            db.licenses.clone(),
            "https://gallery.example.com",
            Arc::new(EventBus::new()),
        )
    }

    #[tokio::test]
    async fn test_activate_then_deactivate() {
        let manager = manager().await;
        let status = manager.license_status().await.unwrap();
        assert_eq!(status.status, LicenseStatus::Inactive);
        assert!(status.license_key.is_none());

        let active = manager.activate_license(" AB12-CD34-EF56-GH78 ").await.unwrap();
        assert_eq!(active.status, LicenseStatus::Active);
        assert_eq!(active.license_key.as_deref(), Some("****-****-****-GH78"));
        assert_eq!(active.site_url.as_deref(), Some("https://gallery.example.com"));
        assert!(!active.expired);
        assert_eq!(active.features["ai_agents"], true);

        let inactive = manager.deactivate_license().await.unwrap();
        assert_eq!(inactive.status, LicenseStatus::Inactive);
        assert_eq!(
            manager.license_status().await.unwrap().status,
            LicenseStatus::Inactive
        );
    }

    #[tokio::test]
    async fn test_rejects_malformed_keys() {
        let manager = manager().await;
        for key in ["ab12-cd34-ef56-gh78", "AB12CD34EF56GH78", "AB12-CD34-EF56"] {
            assert_eq!(
                manager.activate_license(key).await.unwrap_err().code(),
                "invalid_license_format",
                "{key}"
            );
        }
        assert_eq!(manager.activate_license("").await.unwrap_err().code(), "input_error");
    }

    #[tokio::test]
    async fn test_deactivate_without_license() {
        let manager = manager().await;
        assert_eq!(
            manager.deactivate_license().await.unwrap_err().code(),
            "license_not_found"
        );
    }
}
