//! VORTEX Marketplace Core - Ledger, Royalty and Policy Rules
//!
//! Pure domain layer of the VORTEX AI Marketplace. Nothing here touches a
//! database or the network; persistence lives in `vortex-store` and the
//! services that wire everything together live in `vortex-engine`.
//!
//! It provides:
//! - **Ledger rules**: TOLA-only currency, flat per-type fees, sender/recipient fee split
//! - **Royalties**: mint-time royalty list assembly and per-sale payout math
//! - **Revenue**: marketplace commission breakdown
//! - **Wallets**: address format checks and signature verification seam
//! - **Events**: typed publish/subscribe bus for domain side effects
//! - **Policies**: IP anonymization, cache key and TTL rules, license key format
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │              vortex-api (AJAX + SaaS endpoints)              │
//! ├─────────────────────────────────────────────────────────────┤
//! │                vortex-engine (services, config)              │
//! ├──────────────────────────────┬──────────────────────────────┤
//! │    vortex-core (this crate)  │   vortex-store (SQLite)       │
//! └──────────────────────────────┴──────────────────────────────┘
//! ```
//!
//! # Invariants
//!
//! | Rule | Where |
//! |------|-------|
//! | `sender_fee + recipient_fee == fee` | [`fees::split_fee`] |
//! | Only `TOLA` is accepted | [`types::Currency::parse`] |
//! | Platform royalty is always 3% and listed first | [`royalty::RoyaltyPolicy::build_royalties`] |
//! | Payouts are rounded per entry to 6 dp | [`royalty::calculate_distributions`] |
//! | Stored IPs are anonymized | [`privacy::anonymize_ip`] |

pub mod cache_policy;
pub mod error;
pub mod events;
pub mod fees;
pub mod privacy;
pub mod revenue;
pub mod royalty;
pub mod token;
pub mod types;
pub mod wallet;

// Re-export error types
pub use error::{ErrorCategory, VortexError, VortexResult};

// Re-export all types
pub use types::*;

// Re-export policies
pub use cache_policy::{build_key, query_key, CachePolicy, QueryType, DEFAULT_CACHE_PREFIX};
pub use events::{EventBus, EventKind, EventSubscriber, LoggingSubscriber, MarketEvent};
pub use fees::{split_fee, FeeSchedule, SWAP_FEE, TRANSACTION_FEE};
pub use privacy::anonymize_ip;
pub use revenue::{RevenueAllocation, RevenueBreakdown, RevenueSplitter};
pub use royalty::{
    calculate_distributions, round_payout, RoyaltyPolicy, PLATFORM_ROYALTY_PERCENT,
    ROYALTY_PRECISION,
};
pub use token::{generate_token_id, placeholder_chain_status};
pub use wallet::{
    format_wallet_address, is_valid_address, validate_address, Ed25519Verifier,
    SignatureVerifier, VerifierRegistry,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
