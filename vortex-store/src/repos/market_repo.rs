//! Marketplace Repositories (NFTs, wallets, HURAII image library)

use async_trait::async_trait;
use vortex_core::{
    HistoryItem, LibraryImage, NewLibraryImage, NftFromImage, NftRecord, TokenId, UserId,
    WalletBinding,
};

use crate::error::{StoreError, StoreResult};

/// NFT repository trait
#[async_trait]
pub trait NftRepository: Send + Sync {
    /// Insert a minted NFT
    async fn insert(&self, record: NftRecord) -> StoreResult<()>;

    /// Get NFT by token id
    async fn get(&self, token_id: &TokenId) -> StoreResult<Option<NftRecord>>;

    /// List NFTs created by a wallet, newest first
    async fn list_by_creator(&self, wallet: &str, limit: usize) -> StoreResult<Vec<NftRecord>>;
}

/// Wallet binding repository trait
#[async_trait]
pub trait WalletRepository: Send + Sync {
    /// Insert or replace the user's wallet
    async fn upsert(&self, binding: WalletBinding) -> StoreResult<()>;

    /// Get the user's wallet
    async fn get(&self, user_id: UserId) -> StoreResult<Option<WalletBinding>>;

    /// Remove the user's wallet; returns whether a row existed
    async fn delete(&self, user_id: UserId) -> StoreResult<bool>;
}

/// HURAII image library repository trait
#[async_trait]
pub trait ImageRepository: Send + Sync {
    /// Insert an image
    async fn insert(&self, image: NewLibraryImage) -> StoreResult<LibraryImage>;

    /// Get image by ID
    async fn get(&self, id: i64) -> StoreResult<Option<LibraryImage>>;

    /// Get image by ID, error if not found
    async fn get_required(&self, id: i64) -> StoreResult<LibraryImage> {
        self.get(id)
            .await?
            .ok_or_else(|| StoreError::not_found("LibraryImage", id.to_string()))
    }

    /// Page of the user's images, newest first, plus the total count
    async fn list_for_user(
        &self,
        user_id: UserId,
        offset: usize,
        limit: usize,
    ) -> StoreResult<(Vec<LibraryImage>, u64)>;

    /// Mark an image NFT-ready with its metadata
    async fn mark_nft_ready(&self, id: i64, metadata: &NftFromImage) -> StoreResult<()>;

    /// Prepend a history item, keeping at most `cap` per user
    async fn push_history(
        &self,
        user_id: UserId,
        item: HistoryItem,
        cap: usize,
    ) -> StoreResult<()>;

    /// History, newest first
    async fn history(&self, user_id: UserId) -> StoreResult<Vec<HistoryItem>>;
}
