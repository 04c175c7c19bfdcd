//! VORTEX Core Type Definitions
//!
//! All types follow these naming conventions:
//! - snake_case for field names
//! - *_id suffix for primary keys
//! - *_ref suffix for references

pub mod analytics;
pub mod common;
pub mod library;
pub mod license;
pub mod nft;
pub mod transaction;

// Re-export common types
pub use common::{lenient, Currency, Period, SessionId, TokenId, UserId, TOLA};

// Re-export transaction types
pub use transaction::{
    FeeArrangement, FeeBreakdown, NewTransaction, PointsEntry, TransactionReceipt,
    TransactionRecord, TransactionRequest, TransactionStatus, TransactionType,
};

// Re-export NFT types
pub use nft::{
    ChainStatus, MintedNft, Network, NftMetadata, NftRecord, RoyaltyDistribution, RoyaltyEntry,
    RoyaltyShare, WalletBinding,
};

// Re-export analytics types
pub use analytics::{
    ActionSummary, AnalyticsEvent, DayActivity, GrowthPoint, HourActivity, LabeledCount,
    MarketTrends, OverallStats, PageActivity, TrackEvent, UserBehavior,
};

// Re-export library types
pub use library::{
    HistoryItem, ImageGenerationMeta, LibraryImage, LibraryPage, NewLibraryImage, NftFromImage,
    DEFAULT_IMAGE_TITLE, HISTORY_LIMIT, HURAII_ENGINE,
};

// Re-export license types
pub use license::{
    default_features, is_valid_license_format, mask_license_key, LicenseRecord, LicenseStatus,
};
