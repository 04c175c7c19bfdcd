//! VORTEX Store - Marketplace Storage
//!
//! SQLite persistence for the VORTEX marketplace custom tables: the TOLA
//! transaction ledger and points, Thorius analytics and cache, NFTs, wallet
//! bindings, the HURAII image library and license data.
//!
//! # Architecture
//!
//! - [`SqliteDatastore`] - one shared connection, prefixed table names
//! - `XxxRepository` traits - async data access used by `vortex-engine`
//! - `SqliteXxxRepository` - the SQLite implementations
//! - [`VortexDatabase`] - facade wiring every repository to one datastore
//!
//! # Usage Example
//!
//! ```ignore
//! use vortex_store::{SqliteConfig, VortexDatabase};
//!
//! async fn example() {
//!     let db = VortexDatabase::open(&SqliteConfig::default()).unwrap();
//!     db.init_schema().await.unwrap();
//!     let balance = db.ledger.balance(vortex_core::UserId(1)).await.unwrap();
//! }
//! ```

pub mod datastore;
pub mod error;
pub mod repos;
pub mod schema;

// Re-export main types
pub use datastore::{SqliteConfig, SqliteDatastore, MEMORY_PATH, TIMESTAMP_FORMAT};
pub use error::*;
pub use repos::*;
pub use schema::VORTEX_SCHEMA;

use std::sync::Arc;

/// VORTEX Database facade
///
/// Provides unified access to every repository over one datastore.
pub struct VortexDatabase {
    /// Underlying datastore
    datastore: SqliteDatastore,
    /// Transaction ledger and points
    pub ledger: Arc<SqliteLedgerRepository>,
    /// Thorius analytics events
    pub analytics: Arc<SqliteAnalyticsRepository>,
    /// Thorius cache entries
    pub cache: Arc<SqliteCacheRepository>,
    /// Minted NFTs
    pub nfts: Arc<SqliteNftRepository>,
    /// Wallet bindings
    pub wallets: Arc<SqliteWalletRepository>,
    /// HURAII image library
    pub images: Arc<SqliteImageRepository>,
    /// License data
    pub licenses: Arc<SqliteLicenseRepository>,
}

impl VortexDatabase {
    /// Create new database facade over an open datastore
    pub fn new(datastore: SqliteDatastore) -> Self {
        Self {
            ledger: Arc::new(SqliteLedgerRepository::new(datastore.clone())),
            analytics: Arc::new(SqliteAnalyticsRepository::new(datastore.clone())),
            cache: Arc::new(SqliteCacheRepository::new(datastore.clone())),
            nfts: Arc::new(SqliteNftRepository::new(datastore.clone())),
            wallets: Arc::new(SqliteWalletRepository::new(datastore.clone())),
            images: Arc::new(SqliteImageRepository::new(datastore.clone())),
            licenses: Arc::new(SqliteLicenseRepository::new(datastore.clone())),
            datastore,
        }
    }

    /// Open the datastore described by `config`
    pub fn open(config: &SqliteConfig) -> StoreResult<Self> {
        Ok(Self::new(SqliteDatastore::connect(config)?))
    }

    /// Fresh in-memory database, schema not yet created
    pub fn in_memory() -> StoreResult<Self> {
        Ok(Self::new(SqliteDatastore::in_memory()?))
    }

    /// Initialize database schema
    ///
    /// Safe to call on every startup; tables are created only when missing.
    pub async fn init_schema(&self) -> StoreResult<()> {
        self.datastore.init_schema().await?;
        tracing::info!(prefix = %self.datastore.prefix(), "VORTEX database schema initialized");
        Ok(())
    }

    /// Check database health
    pub async fn health_check(&self) -> StoreResult<bool> {
        self.datastore.ping().await.map(|_| true)
    }

    /// Get the underlying datastore
    pub fn datastore(&self) -> &SqliteDatastore {
        &self.datastore
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use vortex_core::UserId;

    #[test]
    fn test_vortex_schema_is_valid() {
        assert!(!VORTEX_SCHEMA.is_empty());
        assert!(VORTEX_SCHEMA.contains("CREATE TABLE"));
        assert!(VORTEX_SCHEMA.contains("vortex_transactions"));
        assert!(VORTEX_SCHEMA.contains("vortex_tola_points"));
        assert!(VORTEX_SCHEMA.contains("vortex_thorius_analytics"));
        assert!(VORTEX_SCHEMA.contains("vortex_thorius_cache"));
        assert!(VORTEX_SCHEMA.contains("vortex_license_data"));
    }

    #[tokio::test]
    async fn test_facade_shares_one_datastore() {
        let db = VortexDatabase::in_memory().unwrap();
        db.init_schema().await.unwrap();
        assert!(db.health_check().await.unwrap());

        db.ledger
            .award_points(UserId(3), Decimal::new(25, 0), "welcome")
            .await
            .unwrap();
        assert_eq!(db.ledger.balance(UserId(3)).await.unwrap(), Decimal::new(25, 0));
    }
}
