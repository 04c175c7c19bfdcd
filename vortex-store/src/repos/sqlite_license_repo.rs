//! SQLite License Repository Implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Row};
use vortex_core::{LicenseRecord, LicenseStatus};

use crate::datastore::{format_ts, parse_ts, SqliteDatastore};
use crate::error::{StoreError, StoreResult};
use crate::repos::{LicenseActivation, LicenseRepository};
use crate::schema;

const LICENSE_COLUMNS: &str =
    "id, license_key, status, expiration_date, site_url, activation_date, last_check, features";

/// SQLite implementation of LicenseRepository
pub struct SqliteLicenseRepository {
    datastore: SqliteDatastore,
    table: String,
}

impl SqliteLicenseRepository {
    /// Create a new repository
    pub fn new(datastore: SqliteDatastore) -> Self {
        Self {
            table: datastore.table(schema::LICENSE),
            datastore,
        }
    }

    fn decode(table: &str, row: &Row<'_>) -> StoreResult<LicenseRecord> {
        let status: String = row.get(2)?;
        let expiration: String = row.get(3)?;
        let activation: String = row.get(5)?;
        let last_check: String = row.get(6)?;
        let features: String = row.get(7)?;
        Ok(LicenseRecord {
            id: row.get(0)?,
            license_key: row.get(1)?,
            status: LicenseStatus::parse(&status),
            expiration_date: parse_ts(table, &expiration)?,
            site_url: row.get(4)?,
            activation_date: parse_ts(table, &activation)?,
            last_check: parse_ts(table, &last_check)?,
            features: serde_json::from_str(&features)
                .map_err(|e| StoreError::corrupt(table, format!("features: {e}")))?,
        })
    }

    async fn select_current(&self) -> StoreResult<Option<LicenseRecord>> {
        let table = self.table.clone();
        self.datastore
            .run(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {LICENSE_COLUMNS} FROM {table} ORDER BY activation_date DESC, id DESC LIMIT 1"
                ))?;
                let mut rows = stmt.query([])?;
                match rows.next()? {
                    Some(row) => Ok(Some(Self::decode(&table, row)?)),
                    None => Ok(None),
                }
            })
            .await
    }
}

#[async_trait]
impl LicenseRepository for SqliteLicenseRepository {
    async fn upsert_active(&self, activation: LicenseActivation) -> StoreResult<LicenseRecord> {
        let table = self.table.clone();
        let features = serde_json::to_string(&activation.features)?;
        let activated_at = format_ts(&activation.activated_at);
        let license_key = activation.license_key.clone();
        self.datastore.run(move |conn| {
            conn.execute(
                &format!(
                    "INSERT INTO {table} (license_key, status, expiration_date, site_url, \
                     activation_date, last_check, features) VALUES (?1, ?2, ?3, ?4, ?5, ?5, ?6) \
                     ON CONFLICT(license_key) DO UPDATE SET status = excluded.status, \
                     expiration_date = excluded.expiration_date, site_url = excluded.site_url, \
                     activation_date = excluded.activation_date, last_check = excluded.last_check, \
                     features = excluded.features"
                ),
                params![
                    activation.license_key,
                    LicenseStatus::Active.as_str(),
                    format_ts(&activation.expiration_date),
                    activation.site_url,
                    activated_at,
                    features,
                ],
            )?;
            Ok(())
        })
        .await?;
        self.select_current()
            .await?
            .ok_or_else(|| StoreError::not_found("License", license_key))
    }

    async fn current(&self) -> StoreResult<Option<LicenseRecord>> {
        self.select_current().await
    }

    async fn set_status(
        &self,
        license_key: &str,
        status: LicenseStatus,
        checked_at: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let table = self.table.clone();
        let license_key = license_key.to_string();
        self.datastore
            .run(move |conn| {
                let updated = conn.execute(
                    &format!("UPDATE {table} SET status = ?1, last_check = ?2 WHERE license_key = ?3"),
                    params![status.as_str(), format_ts(&checked_at), license_key],
                )?;
                Ok(updated > 0)
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use vortex_core::default_features;

    async fn repo() -> SqliteLicenseRepository {
        let ds = SqliteDatastore::in_memory().unwrap();
        ds.init_schema().await.unwrap();
        SqliteLicenseRepository::new(ds)
    }

    fn activation(key: &str) -> LicenseActivation {
        let now = Utc::now();
        LicenseActivation {
            license_key: key.into(),
            site_url: "https://gallery.example.com".into(),
            expiration_date: now + Duration::days(365),
            activated_at: now,
            features: default_features(),
        }
    }

    #[tokio::test]
    async fn test_activate_and_deactivate() {
        let repo = repo().await;
        assert!(repo.current().await.unwrap().is_none());

        let record = repo.upsert_active(activation("AB12-CD34-EF56-GH78")).await.unwrap();
        assert_eq!(record.status, LicenseStatus::Active);
        assert_eq!(record.features["ai_agents"], true);

        assert!(repo
            .set_status("AB12-CD34-EF56-GH78", LicenseStatus::Inactive, Utc::now())
            .await
            .unwrap());
        assert_eq!(repo.current().await.unwrap().unwrap().status, LicenseStatus::Inactive);
        assert!(!repo.set_status("ZZZZ-ZZZZ-ZZZZ-ZZZZ", LicenseStatus::Inactive, Utc::now()).await.unwrap());
    }

    #[tokio::test]
    async fn test_reactivation_updates_same_row() {
        let repo = repo().await;
        let first = repo.upsert_active(activation("AB12-CD34-EF56-GH78")).await.unwrap();
        let second = repo.upsert_active(activation("AB12-CD34-EF56-GH78")).await.unwrap();
        assert_eq!(first.id, second.id);
    }
}
