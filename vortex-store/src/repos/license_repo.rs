//! License Repository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use vortex_core::{LicenseRecord, LicenseStatus};

use crate::error::StoreResult;

/// Fields written on activation
#[derive(Clone, Debug, PartialEq)]
pub struct LicenseActivation {
    pub license_key: String,
    pub site_url: String,
    pub expiration_date: DateTime<Utc>,
    pub activated_at: DateTime<Utc>,
    pub features: serde_json::Value,
}

/// License repository trait
#[async_trait]
pub trait LicenseRepository: Send + Sync {
    /// Insert or refresh the row for the key, status `active`
    async fn upsert_active(&self, activation: LicenseActivation) -> StoreResult<LicenseRecord>;

    /// Most recently activated license, if any
    async fn current(&self) -> StoreResult<Option<LicenseRecord>>;

    /// Set status and `last_check` for a key; returns whether a row matched
    async fn set_status(
        &self,
        license_key: &str,
        status: LicenseStatus,
        checked_at: DateTime<Utc>,
    ) -> StoreResult<bool>;
}
