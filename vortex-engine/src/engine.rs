//! Service container
//!
//! Builds every service once from an [`EngineConfig`] and one database.

use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};
use vortex_core::{EventBus, EventKind, LoggingSubscriber};
use vortex_store::VortexDatabase;

use crate::config::EngineConfig;
use crate::error::EngineResult;
use crate::services::{
    AnalyticsService, BlockchainFacade, CacheService, CacheStats, ImageLibrary, LicenseManager,
    TransactionService, WalletManager,
};

const ALL_EVENT_KINDS: [EventKind; 7] = [
    EventKind::WalletConnected,
    EventKind::WalletDisconnected,
    EventKind::TransactionCompleted,
    EventKind::NftMinted,
    EventKind::ImageSaved,
    EventKind::AnalyticsTracked,
    EventKind::LicenseChanged,
];

/// Component health snapshot
#[derive(Debug, Clone, Serialize)]
pub struct EngineHealth {
    pub database: bool,
    pub cache: Option<CacheStats>,
    /// `(provider, configured)`; key values are never included
    pub ai_providers: Vec<(&'static str, bool)>,
}

impl EngineHealth {
    pub fn is_healthy(&self) -> bool {
        self.database
    }
}

/// Result of a maintenance run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MaintenanceReport {
    pub cache_purged: usize,
    pub analytics_deleted: usize,
}

/// All marketplace services over one database and one event bus
pub struct VortexEngine {
    config: EngineConfig,
    database: Arc<VortexDatabase>,
    events: Arc<EventBus>,
    pub transactions: TransactionService,
    pub wallets: WalletManager,
    pub blockchain: BlockchainFacade,
    pub analytics: AnalyticsService,
    pub cache: CacheService,
    pub library: ImageLibrary,
    pub licenses: LicenseManager,
}

impl VortexEngine {
    /// Open the configured database, create the schema and wire the services
    ///
    /// Fails when the database cannot be opened; callers treat that as fatal.
    pub async fn bootstrap(config: EngineConfig) -> EngineResult<Self> {
        let database = VortexDatabase::open(&config.database)?;
        database.init_schema().await?;
        info!(
            path = %config.database.path,
            prefix = %config.database.table_prefix,
            "VORTEX engine database ready"
        );
        Ok(Self::with_database(config, database))
    }

    /// Engine over a fresh in-memory database; `config.database` is ignored
    pub async fn in_memory(mut config: EngineConfig) -> EngineResult<Self> {
        config.database = vortex_store::SqliteConfig::default();
        Self::bootstrap(config).await
    }

    /// Wire services over an already-initialized database
    pub fn with_database(config: EngineConfig, database: VortexDatabase) -> Self {
        let events = Arc::new(EventBus::new());
        let logger = Arc::new(LoggingSubscriber);
        for kind in ALL_EVENT_KINDS {
            events.subscribe(kind, logger.clone());
        }

        if config.blockchain.platform_wallet.is_none() {
            warn!("VORTEX_BLOCKCHAIN_PLATFORM_WALLET not set; NFT minting is disabled");
        }

        Self {
            transactions: TransactionService::new(database.ledger.clone(), events.clone()),
            wallets: WalletManager::new(
                database.ledger.clone(),
                database.wallets.clone(),
                events.clone(),
            ),
            blockchain: BlockchainFacade::new(
                database.nfts.clone(),
                &config.blockchain,
                events.clone(),
            ),
            analytics: AnalyticsService::new(database.analytics.clone(), events.clone()),
            cache: CacheService::new(database.cache.clone(), &config.cache),
            library: ImageLibrary::new(database.images.clone(), events.clone()),
            licenses: LicenseManager::new(
                database.licenses.clone(),
                config.site_url(),
                events.clone(),
            ),
            database: Arc::new(database),
            events,
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn database(&self) -> &Arc<VortexDatabase> {
        &self.database
    }

    /// Shared bus; subscribe here to observe marketplace events
    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    pub async fn health(&self) -> EngineHealth {
        let database = match self.database.health_check().await {
            Ok(ok) => ok,
            Err(e) => {
                warn!(error = %e, "database health check failed");
                false
            }
        };
        let cache = if database {
            self.cache.stats().await.ok()
        } else {
            None
        };
        EngineHealth {
            database,
            cache,
            ai_providers: self.config.ai_providers.configured(),
        }
    }

    /// Purge expired cache rows and, when `analytics_days` is given, old
    /// analytics rows
    pub async fn run_maintenance(
        &self,
        analytics_days: Option<u32>,
    ) -> EngineResult<MaintenanceReport> {
        let cache_purged = self.cache.purge_expired().await?;
        let analytics_deleted = match analytics_days {
            Some(days) => self.analytics.cleanup_older_than(days).await?,
            None => 0,
        };
        info!(cache_purged, analytics_deleted, "maintenance finished");
        Ok(MaintenanceReport {
            cache_purged,
            analytics_deleted,
        })
    }
}
