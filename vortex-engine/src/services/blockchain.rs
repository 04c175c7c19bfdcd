//! Blockchain Facade (mock)
//!
//! Minting is local bookkeeping: the token id is fabricated, the record is
//! stored in the NFT table and every receipt says `placeholder: true`. No
//! chain is contacted.

use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{info, warn};
use vortex_core::{
    calculate_distributions, generate_token_id, is_valid_address, placeholder_chain_status,
    ChainStatus, EventBus, MarketEvent, MintedNft, Network, NftMetadata, NftRecord,
    RevenueBreakdown, RevenueSplitter, RoyaltyDistribution, RoyaltyPolicy, TokenId, VortexError,
};
use vortex_store::NftRepository;

use crate::config::BlockchainConfig;
use crate::error::EngineResult;

/// Mock chain facade
pub struct BlockchainFacade {
    nfts: Arc<dyn NftRepository>,
    network: Network,
    platform_wallet: Option<String>,
    royalties: RoyaltyPolicy,
    revenue: RevenueSplitter,
    events: Arc<EventBus>,
}

impl BlockchainFacade {
    pub fn new(nfts: Arc<dyn NftRepository>, config: &BlockchainConfig, events: Arc<EventBus>) -> Self {
        Self {
            nfts,
            network: config.network.clone(),
            platform_wallet: config.platform_wallet.clone(),
            royalties: config.royalty_policy(),
            revenue: RevenueSplitter::default(),
            events,
        }
    }

    /// Replace the DAO revenue splitter
    pub fn with_revenue_splitter(mut self, revenue: RevenueSplitter) -> Self {
        self.revenue = revenue;
        self
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    /// Record a new (mock) NFT
    ///
    /// Nothing is persisted unless title, image and creator wallet are all
    /// present.
    pub async fn mint_nft(&self, metadata: NftMetadata) -> EngineResult<MintedNft> {
        let platform_wallet = self
            .platform_wallet
            .as_deref()
            .filter(|w| !w.is_empty())
            .ok_or(VortexError::PlatformWalletMissing)?;

        for (field, value) in [
            ("title", &metadata.title),
            ("image", &metadata.image),
            ("creator_wallet", &metadata.creator_wallet),
        ] {
            if value.trim().is_empty() {
                warn!(field, "NFT mint rejected: missing field");
                return Err(VortexError::missing(field).into());
            }
        }

        let royalties = self.royalties.build_royalties(platform_wallet, &metadata)?;
        let now = Utc::now();
        let token_id = generate_token_id(now);

        self.nfts
            .insert(NftRecord {
                token_id: token_id.clone(),
                title: metadata.title,
                description: metadata.description,
                image: metadata.image,
                creator_wallet: metadata.creator_wallet.clone(),
                network: self.network.clone(),
                royalties: royalties.clone(),
                created_at: now,
            })
            .await?;

        info!(token_id = %token_id, royalties = royalties.len(), "NFT recorded (placeholder mint)");
        self.events.publish(&MarketEvent::NftMinted {
            token_id: token_id.clone(),
            creator_wallet: metadata.creator_wallet,
            royalty_count: royalties.len(),
            timestamp: now,
        });

        Ok(MintedNft {
            token_id,
            royalties,
            network: self.network.clone(),
            placeholder: true,
        })
    }

    /// Per-recipient payouts for a sale; empty for an unknown token
    pub async fn calculate_royalties(
        &self,
        token_id: &TokenId,
        sale_amount: Decimal,
    ) -> EngineResult<Vec<RoyaltyDistribution>> {
        if sale_amount < Decimal::ZERO {
            return Err(VortexError::InvalidAmount {
                reason: "sale amount must not be negative".to_string(),
            }
            .into());
        }
        Ok(match self.nfts.get(token_id).await? {
            Some(record) => calculate_distributions(&record.royalties, sale_amount),
            None => Vec::new(),
        })
    }

    /// Placeholder status; always `confirmed`
    pub fn get_transaction_status(&self, tx_hash: &str) -> ChainStatus {
        tracing::debug!(tx_hash, "placeholder chain status requested");
        placeholder_chain_status(&self.network, Utc::now())
    }

    pub fn is_valid_address(&self, address: &str, network: Option<&Network>) -> bool {
        is_valid_address(address, network.unwrap_or(&self.network))
    }

    /// Split a sale between seller, marketplace and the DAO buckets
    pub fn distribute_revenue(&self, sale_amount: Decimal) -> EngineResult<RevenueBreakdown> {
        Ok(self.revenue.split(sale_amount)?)
    }

    /// Stored NFT, if any
    pub async fn get_nft(&self, token_id: &TokenId) -> EngineResult<Option<NftRecord>> {
        Ok(self.nfts.get(token_id).await?)
    }
}
