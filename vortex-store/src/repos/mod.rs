//! VORTEX Store Repositories
//!
//! Data access layer for the marketplace tables.

mod analytics_repo;
mod ledger_repo;
mod license_repo;
mod market_repo;

// SQLite implementations
mod sqlite_analytics_repo;
mod sqlite_ledger_repo;
mod sqlite_license_repo;
mod sqlite_market_repo;

// Export repository traits
pub use analytics_repo::*;
pub use ledger_repo::*;
pub use license_repo::*;
pub use market_repo::*;

// Export SQLite implementations
pub use sqlite_analytics_repo::*;
pub use sqlite_ledger_repo::*;
pub use sqlite_license_repo::*;
pub use sqlite_market_repo::*;
