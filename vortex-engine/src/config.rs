//! Engine Configuration
//!
//! Every section is read from `VORTEX_*` environment variables. Call
//! `dotenvy::dotenv()` before [`EngineConfig::from_env`] to pick up a
//! `.env` file.

use rust_decimal::Decimal;
use std::fmt;
use std::time::Duration;
use vortex_core::cache_policy::DEFAULT_TTL;
use vortex_core::{CachePolicy, Network, RoyaltyPolicy, DEFAULT_CACHE_PREFIX};
use vortex_store::SqliteConfig;

use crate::error::{EngineError, EngineResult};

/// Site URL recorded on license activation when none is configured
pub const DEFAULT_SITE_URL: &str = "http://localhost";

/// Keys for the external AI providers
///
/// Values are never logged or returned; health checks only report presence.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct AiProviderKeys {
    pub openai: Option<String>,
    pub anthropic: Option<String>,
    pub huggingface: Option<String>,
    pub stability: Option<String>,
}

impl AiProviderKeys {
    /// `(provider, configured)` pairs in a stable order
    pub fn configured(&self) -> Vec<(&'static str, bool)> {
        vec![
            ("openai", self.openai.is_some()),
            ("anthropic", self.anthropic.is_some()),
            ("huggingface", self.huggingface.is_some()),
            ("stability", self.stability.is_some()),
        ]
    }

    pub fn any_configured(&self) -> bool {
        self.configured().iter().any(|(_, present)| *present)
    }
}

impl fmt::Debug for AiProviderKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("AiProviderKeys");
        for (name, present) in self.configured() {
            s.field(name, &if present { "<redacted>" } else { "<unset>" });
        }
        s.finish()
    }
}

/// Mock chain settings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockchainConfig {
    /// Network recorded on minted tokens
    pub network: Network,
    /// Wallet receiving the 3% platform royalty
    pub platform_wallet: Option<String>,
    /// Reject mints whose royalties sum above this percentage
    pub royalty_cap: Option<Decimal>,
}

impl BlockchainConfig {
    pub fn royalty_policy(&self) -> RoyaltyPolicy {
        RoyaltyPolicy {
            max_total_percentage: self.royalty_cap,
        }
    }
}

/// Thorius cache settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    pub prefix: String,
    pub default_ttl: Duration,
    pub enabled: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_CACHE_PREFIX.to_string(),
            default_ttl: DEFAULT_TTL,
            enabled: true,
        }
    }
}

impl CacheConfig {
    pub fn policy(&self) -> CachePolicy {
        CachePolicy::new(self.prefix.clone(), self.default_ttl)
    }
}

/// Top-level engine configuration
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    pub database: SqliteConfig,
    pub blockchain: BlockchainConfig,
    pub cache: CacheConfig,
    pub ai_providers: AiProviderKeys,
    /// Public site URL stored with license activations
    pub site_url: Option<String>,
    /// Expose server error details to clients
    pub debug: bool,
}

impl EngineConfig {
    /// Create from environment variables
    pub fn from_env() -> EngineResult<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> EngineResult<Self> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let mut database = SqliteConfig::default();
        if let Some(path) = get("VORTEX_DB_PATH") {
            database.path = path;
        }
        if let Some(prefix) = get("VORTEX_DB_PREFIX") {
            database.table_prefix = prefix;
        }

        let royalty_cap = match get("VORTEX_BLOCKCHAIN_ROYALTY_CAP") {
            Some(raw) => Some(raw.parse::<Decimal>().map_err(|e| {
                EngineError::config(format!("VORTEX_BLOCKCHAIN_ROYALTY_CAP: {e}"))
            })?),
            None => None,
        };
        let blockchain = BlockchainConfig {
            network: get("VORTEX_BLOCKCHAIN_NETWORK")
                .map(|n| Network::parse(&n))
                .unwrap_or_default(),
            platform_wallet: get("VORTEX_BLOCKCHAIN_PLATFORM_WALLET"),
            royalty_cap,
        };

        let mut cache = CacheConfig::default();
        if let Some(prefix) = get("VORTEX_CACHE_PREFIX") {
            cache.prefix = prefix;
        }
        if let Some(raw) = get("VORTEX_CACHE_DEFAULT_TTL") {
            let secs: u64 = raw
                .parse()
                .map_err(|e| EngineError::config(format!("VORTEX_CACHE_DEFAULT_TTL: {e}")))?;
            cache.default_ttl = Duration::from_secs(secs);
        }
        if let Some(raw) = get("VORTEX_CACHE_ENABLED") {
            cache.enabled = parse_flag(&raw);
        }

        let ai_providers = AiProviderKeys {
            openai: get("VORTEX_OPENAI_API_KEY"),
            anthropic: get("VORTEX_ANTHROPIC_API_KEY"),
            huggingface: get("VORTEX_HUGGINGFACE_API_KEY"),
            stability: get("VORTEX_STABILITY_API_KEY"),
        };

        Ok(Self {
            database,
            blockchain,
            cache,
            ai_providers,
            site_url: get("VORTEX_SITE_URL"),
            debug: get("VORTEX_DEBUG").map(|v| parse_flag(&v)).unwrap_or(false),
        })
    }

    pub fn site_url(&self) -> &str {
        self.site_url.as_deref().unwrap_or(DEFAULT_SITE_URL)
    }
}

/// `false`, `0`, `no` and `off` disable; anything else enables
pub fn parse_flag(raw: &str) -> bool {
    !matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "false" | "0" | "no" | "off"
    )
}
