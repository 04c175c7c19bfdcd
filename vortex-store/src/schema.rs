//! SQLite schema definitions for the VORTEX marketplace tables
//!
//! Every table name carries the configured prefix (`wp_` by default) in
//! front of the `vortex_` stem, e.g. `wp_vortex_transactions`.

/// Placeholder replaced with the table prefix
const PREFIX_MARKER: &str = "{p}";

/// Table stems, without prefix
pub const TRANSACTIONS: &str = "vortex_transactions";
pub const TOLA_POINTS: &str = "vortex_tola_points";
pub const ANALYTICS: &str = "vortex_thorius_analytics";
pub const CACHE: &str = "vortex_thorius_cache";
pub const LICENSE: &str = "vortex_license_data";
pub const NFTS: &str = "vortex_nfts";
pub const WALLETS: &str = "vortex_wallets";
pub const IMAGES: &str = "vortex_huraii_images";
pub const IMAGE_HISTORY: &str = "vortex_huraii_history";

/// All table stems, in creation order
pub const VORTEX_TABLES: &[&str] = &[
    TRANSACTIONS,
    TOLA_POINTS,
    ANALYTICS,
    CACHE,
    LICENSE,
    NFTS,
    WALLETS,
    IMAGES,
    IMAGE_HISTORY,
];

/// Complete VORTEX schema; `{p}` is the table prefix
pub const VORTEX_SCHEMA: &str = r#"
-- ============================================
-- Transaction Ledger (append-only)
-- ============================================
CREATE TABLE IF NOT EXISTS {p}vortex_transactions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    sender_id INTEGER NOT NULL,
    recipient_id INTEGER NOT NULL,
    amount TEXT NOT NULL,
    fee TEXT NOT NULL,
    sender_fee TEXT NOT NULL,
    recipient_fee TEXT NOT NULL,
    type TEXT NOT NULL,
    item_id INTEGER,
    currency TEXT NOT NULL DEFAULT 'TOLA' CHECK (currency = 'TOLA'),
    status TEXT NOT NULL DEFAULT 'completed',
    idempotency_key TEXT UNIQUE,
    fingerprint TEXT NOT NULL,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS {p}idx_tx_sender ON {p}vortex_transactions (sender_id);
CREATE INDEX IF NOT EXISTS {p}idx_tx_recipient ON {p}vortex_transactions (recipient_id);

-- ============================================
-- TOLA Points (balance = SUM(points))
-- ============================================
CREATE TABLE IF NOT EXISTS {p}vortex_tola_points (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL,
    points TEXT NOT NULL,
    reason TEXT NOT NULL DEFAULT '',
    transaction_ref INTEGER,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS {p}idx_points_user ON {p}vortex_tola_points (user_id);

-- ============================================
-- Thorius Analytics
-- ============================================
CREATE TABLE IF NOT EXISTS {p}vortex_thorius_analytics (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL DEFAULT 0,
    session_id TEXT NOT NULL,
    action_type TEXT NOT NULL,
    action_data TEXT NOT NULL DEFAULT '{}',
    page_url TEXT NOT NULL DEFAULT '',
    referrer TEXT NOT NULL DEFAULT '',
    ip_address TEXT NOT NULL DEFAULT '',
    user_agent TEXT NOT NULL DEFAULT '',
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS {p}idx_analytics_user ON {p}vortex_thorius_analytics (user_id);
CREATE INDEX IF NOT EXISTS {p}idx_analytics_action ON {p}vortex_thorius_analytics (action_type);
CREATE INDEX IF NOT EXISTS {p}idx_analytics_created ON {p}vortex_thorius_analytics (created_at);

-- ============================================
-- Thorius Cache
-- ============================================
CREATE TABLE IF NOT EXISTS {p}vortex_thorius_cache (
    cache_key TEXT PRIMARY KEY,
    cache_value TEXT NOT NULL,
    expiration INTEGER NOT NULL,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS {p}idx_cache_expiration ON {p}vortex_thorius_cache (expiration);

-- ============================================
-- License Data
-- ============================================
CREATE TABLE IF NOT EXISTS {p}vortex_license_data (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    license_key TEXT NOT NULL UNIQUE,
    status TEXT NOT NULL,
    expiration_date TEXT NOT NULL,
    site_url TEXT NOT NULL,
    activation_date TEXT NOT NULL,
    last_check TEXT NOT NULL,
    features TEXT NOT NULL
);

-- ============================================
-- NFTs (local records, never on chain)
-- ============================================
CREATE TABLE IF NOT EXISTS {p}vortex_nfts (
    token_id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    image TEXT NOT NULL,
    creator_wallet TEXT NOT NULL,
    network TEXT NOT NULL,
    royalties TEXT NOT NULL,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS {p}idx_nft_creator ON {p}vortex_nfts (creator_wallet);

-- ============================================
-- Wallet Bindings (one per user)
-- ============================================
CREATE TABLE IF NOT EXISTS {p}vortex_wallets (
    user_id INTEGER PRIMARY KEY,
    address TEXT NOT NULL,
    wallet_type TEXT NOT NULL,
    network TEXT NOT NULL,
    connected_at TEXT NOT NULL
);

-- ============================================
-- HURAII Image Library
-- ============================================
CREATE TABLE IF NOT EXISTS {p}vortex_huraii_images (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL,
    title TEXT NOT NULL,
    image_url TEXT NOT NULL,
    meta TEXT NOT NULL,
    engine TEXT NOT NULL,
    ai_generated INTEGER NOT NULL DEFAULT 1,
    blockchain_verified INTEGER NOT NULL DEFAULT 0,
    nft_ready INTEGER NOT NULL DEFAULT 0,
    nft_metadata TEXT,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS {p}idx_images_user ON {p}vortex_huraii_images (user_id, created_at);

CREATE TABLE IF NOT EXISTS {p}vortex_huraii_history (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL,
    image_id INTEGER NOT NULL,
    url TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    mode TEXT NOT NULL DEFAULT '',
    date TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS {p}idx_history_user ON {p}vortex_huraii_history (user_id);
"#;

/// Schema with the prefix applied
pub fn render_schema(prefix: &str) -> String {
    VORTEX_SCHEMA.replace(PREFIX_MARKER, prefix)
}

/// Prefixes end up in identifiers, so only `[A-Za-z0-9_]` is allowed
pub fn is_valid_prefix(prefix: &str) -> bool {
    prefix.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_is_valid() {
        assert!(!VORTEX_SCHEMA.is_empty());
        assert!(VORTEX_SCHEMA.contains("CREATE TABLE"));
        for table in VORTEX_TABLES {
            assert!(
                VORTEX_SCHEMA.contains(&format!("{{p}}{table} (")),
                "missing table {table}"
            );
        }
    }

    #[test]
    fn test_render_applies_prefix() {
        let sql = render_schema("wp_");
        assert!(sql.contains("wp_vortex_transactions"));
        assert!(sql.contains("wp_idx_tx_sender"));
        assert!(!sql.contains("{p}"));
    }

    #[test]
    fn test_prefix_validation() {
        assert!(is_valid_prefix("wp_"));
        assert!(is_valid_prefix(""));
        assert!(!is_valid_prefix("wp; DROP TABLE x"));
        assert!(!is_valid_prefix("wp-"));
    }
}
