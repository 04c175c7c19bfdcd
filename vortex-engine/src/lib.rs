//! VORTEX Engine - Marketplace Services
//!
//! Explicitly wired services over `vortex-store`:
//!
//! | Service | Responsibility |
//! |---------|----------------|
//! | [`TransactionService`] | TOLA transfers, fees, points awards |
//! | [`WalletManager`] | Balances, wallet bindings, signature checks |
//! | [`BlockchainFacade`] | Placeholder minting, royalties, revenue split |
//! | [`AnalyticsService`] | Thorius event tracking and aggregation |
//! | [`CacheService`] | Thorius cache with per-query-type TTLs |
//! | [`ImageLibrary`] | HURAII saved images and NFT preparation |
//! | [`LicenseManager`] | Local license activation records |
//!
//! [`VortexEngine`] builds all of them from one [`EngineConfig`].

pub mod config;
pub mod engine;
pub mod error;
pub mod logging;
pub mod services;

pub use config::{parse_flag, AiProviderKeys, BlockchainConfig, CacheConfig, EngineConfig};
pub use engine::{EngineHealth, MaintenanceReport, VortexEngine};
pub use error::{EngineError, EngineResult};
pub use logging::{init_logging, LogConfig, LogFormat, LogLevel};
pub use services::*;
