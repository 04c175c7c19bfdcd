//! Token id and placeholder chain receipts.
//!
//! No chain is contacted anywhere in this crate. Token ids are local
//! identifiers and chain status is generated, marked `placeholder`.

use crate::types::{ChainStatus, Network, TokenId};
use chrono::{DateTime, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;

/// Token id prefix
pub const TOKEN_PREFIX: &str = "vortex";

/// Length of the random suffix
pub const TOKEN_SUFFIX_LEN: usize = 8;

/// Block number range reported by placeholder receipts
pub const PLACEHOLDER_BLOCK_RANGE: std::ops::RangeInclusive<u64> = 10_000_000..=20_000_000;

/// `vortex_{unix_ts}_{8 alphanumerics}`
pub fn generate_token_id(now: DateTime<Utc>) -> TokenId {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_SUFFIX_LEN)
        .map(char::from)
        .collect();
    TokenId(format!("{TOKEN_PREFIX}_{}_{suffix}", now.timestamp()))
}

/// Placeholder "confirmed" receipt for any transaction hash
pub fn placeholder_chain_status(network: &Network, now: DateTime<Utc>) -> ChainStatus {
    ChainStatus {
        status: "confirmed".to_string(),
        block_number: rand::thread_rng().gen_range(PLACEHOLDER_BLOCK_RANGE),
        timestamp: now.timestamp(),
        network: network.clone(),
        placeholder: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_token_id_format() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        let id = generate_token_id(now);
        let parts: Vec<&str> = id.as_str().split('_').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "vortex");
        assert_eq!(parts[1], now.timestamp().to_string());
        assert_eq!(parts[2].len(), TOKEN_SUFFIX_LEN);
        assert!(parts[2].chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_token_ids_differ() {
        let now = Utc::now();
        assert_ne!(generate_token_id(now), generate_token_id(now));
    }

    #[test]
    fn test_placeholder_status() {
        let status = placeholder_chain_status(&Network::Polygon, Utc::now());
        assert_eq!(status.status, "confirmed");
        assert!(status.placeholder);
        assert!(PLACEHOLDER_BLOCK_RANGE.contains(&status.block_number));
    }
}
