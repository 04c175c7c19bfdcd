//! NFT and Royalty Types

use super::common::{TokenId, UserId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Chain network a wallet or token lives on
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Network {
    Ethereum,
    Polygon,
    Solana,
    Other(String),
}

impl Network {
    pub fn parse(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "ethereum" | "eth" => Network::Ethereum,
            "polygon" | "matic" => Network::Polygon,
            "solana" | "sol" => Network::Solana,
            other => Network::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Network::Ethereum => "ethereum",
            Network::Polygon => "polygon",
            Network::Solana => "solana",
            Network::Other(s) => s,
        }
    }

    /// EVM networks share the `0x` + 40 hex address format
    pub fn is_evm(&self) -> bool {
        matches!(self, Network::Ethereum | Network::Polygon)
    }
}

impl Default for Network {
    fn default() -> Self {
        Network::Polygon
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Network {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Network {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let s = String::deserialize(d)?;
        Ok(Network::parse(&s))
    }
}

/// Additional royalty recipient supplied at mint time
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RoyaltyShare {
    #[serde(default)]
    pub wallet: String,
    #[serde(default, deserialize_with = "super::common::lenient::opt_decimal")]
    pub percentage: Option<Decimal>,
}

/// Mint request metadata
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NftMetadata {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub creator_wallet: String,
    /// Extra creator royalty percentage on top of the platform share
    #[serde(default, deserialize_with = "super::common::lenient::opt_decimal")]
    pub creator_royalty: Option<Decimal>,
    #[serde(default)]
    pub royalty_shares: Vec<RoyaltyShare>,
}

/// Stored royalty line: wallet receives `percentage`% of each sale
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoyaltyEntry {
    pub wallet: String,
    pub percentage: Decimal,
}

impl RoyaltyEntry {
    pub fn new(wallet: impl Into<String>, percentage: Decimal) -> Self {
        Self {
            wallet: wallet.into(),
            percentage,
        }
    }
}

/// Persisted (mock) NFT
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NftRecord {
    pub token_id: TokenId,
    pub title: String,
    pub description: String,
    pub image: String,
    pub creator_wallet: String,
    pub network: Network,
    pub royalties: Vec<RoyaltyEntry>,
    pub created_at: DateTime<Utc>,
}

impl NftRecord {
    /// Sum of all stored royalty percentages
    pub fn total_royalty_percentage(&self) -> Decimal {
        self.royalties.iter().map(|r| r.percentage).sum()
    }
}

/// One computed royalty payout for a sale
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoyaltyDistribution {
    pub wallet: String,
    pub percentage: Decimal,
    pub amount: Decimal,
}

/// Wallet bound to a user account (one per user)
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletBinding {
    pub user_id: UserId,
    pub address: String,
    pub wallet_type: String,
    pub network: Network,
    pub connected_at: DateTime<Utc>,
}

/// Placeholder chain receipt; no chain is contacted
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainStatus {
    pub status: String,
    pub block_number: u64,
    pub timestamp: i64,
    pub network: Network,
    pub placeholder: bool,
}

/// Result of a successful mint
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MintedNft {
    pub token_id: TokenId,
    pub royalties: Vec<RoyaltyEntry>,
    pub network: Network,
    /// Always true: minting is local bookkeeping only
    pub placeholder: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_parse() {
        assert_eq!(Network::parse("Ethereum"), Network::Ethereum);
        assert_eq!(Network::parse("matic"), Network::Polygon);
        assert_eq!(Network::parse("solana"), Network::Solana);
        assert_eq!(Network::parse("tezos"), Network::Other("tezos".into()));
        assert!(Network::Polygon.is_evm());
        assert!(!Network::Solana.is_evm());
    }

    #[test]
    fn test_metadata_accepts_string_percentages() {
        let meta: NftMetadata = serde_json::from_str(
            r#"{
                "title": "Dawn",
                "image": "https://example.com/a.png",
                "creator_wallet": "0xabc",
                "creator_royalty": "5",
                "royalty_shares": [{"wallet": "0xdef", "percentage": 2.5}]
            }"#,
        )
        .unwrap();
        assert_eq!(meta.creator_royalty, Some(Decimal::new(5, 0)));
        assert_eq!(meta.royalty_shares[0].percentage, Some(Decimal::new(25, 1)));
        assert!(meta.description.is_empty());
    }
}
