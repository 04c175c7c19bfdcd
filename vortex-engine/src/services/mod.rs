//! VORTEX Marketplace Services
//!
//! Each service takes its repositories and the shared event bus at
//! construction; nothing is looked up globally.

pub mod analytics;
pub mod blockchain;
pub mod cache;
pub mod library;
pub mod license;
pub mod transaction;
pub mod wallet;

pub use analytics::AnalyticsService;
pub use blockchain::BlockchainFacade;
pub use cache::{CacheService, CacheStats};
pub use library::{validate_image_url, ImageLibrary, NftDraft, SaveImageRequest};
pub use license::{LicenseManager, LicenseSummary};
pub use transaction::TransactionService;
pub use wallet::{ConnectedWallet, WalletManager};
