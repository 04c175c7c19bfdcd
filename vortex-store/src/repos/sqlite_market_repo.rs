//! SQLite Marketplace Repository Implementations
//!
//! Implements NftRepository, WalletRepository and ImageRepository.

use async_trait::async_trait;
use rusqlite::{params, OptionalExtension, Row};
use vortex_core::{
    HistoryItem, LibraryImage, Network, NewLibraryImage, NftFromImage, NftRecord, RoyaltyEntry,
    TokenId, UserId, WalletBinding, HURAII_ENGINE,
};

use crate::datastore::{format_ts, parse_ts, user_from, user_param, SqliteDatastore};
use crate::error::{StoreError, StoreResult};
use crate::repos::{ImageRepository, NftRepository, WalletRepository};
use crate::schema;

// ============================================================
// NFTs
// ============================================================

/// SQLite implementation of NftRepository
pub struct SqliteNftRepository {
    datastore: SqliteDatastore,
    table: String,
}

impl SqliteNftRepository {
    /// Create a new repository
    pub fn new(datastore: SqliteDatastore) -> Self {
        Self {
            table: datastore.table(schema::NFTS),
            datastore,
        }
    }

    fn decode(table: &str, row: &Row<'_>) -> StoreResult<NftRecord> {
        let royalties: String = row.get(6)?;
        let royalties: Vec<RoyaltyEntry> = serde_json::from_str(&royalties)
            .map_err(|e| StoreError::corrupt(table, format!("royalties: {e}")))?;
        let network: String = row.get(5)?;
        let created_at: String = row.get(7)?;
        Ok(NftRecord {
            token_id: TokenId(row.get(0)?),
            title: row.get(1)?,
            description: row.get(2)?,
            image: row.get(3)?,
            creator_wallet: row.get(4)?,
            network: Network::parse(&network),
            royalties,
            created_at: parse_ts(table, &created_at)?,
        })
    }
}

const NFT_COLUMNS: &str =
    "token_id, title, description, image, creator_wallet, network, royalties, created_at";

#[async_trait]
impl NftRepository for SqliteNftRepository {
    async fn insert(&self, record: NftRecord) -> StoreResult<()> {
        let table = self.table.clone();
        let royalties = serde_json::to_string(&record.royalties)?;
        self.datastore.run(move |conn| {
            conn.execute(
                &format!("INSERT INTO {table} ({NFT_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"),
                params![
                    record.token_id.as_str(),
                    record.title,
                    record.description,
                    record.image,
                    record.creator_wallet,
                    record.network.as_str(),
                    royalties,
                    format_ts(&record.created_at),
                ],
            )?;
            Ok(())
        })
        .await
    }

    async fn get(&self, token_id: &TokenId) -> StoreResult<Option<NftRecord>> {
        let table = self.table.clone();
        let token_id = token_id.clone();
        self.datastore.run(move |conn| {
            let mut stmt =
                conn.prepare(&format!("SELECT {NFT_COLUMNS} FROM {table} WHERE token_id = ?1"))?;
            let mut rows = stmt.query(params![token_id.as_str()])?;
            match rows.next()? {
                Some(row) => Ok(Some(Self::decode(&table, row)?)),
                None => Ok(None),
            }
        })
        .await
    }

    async fn list_by_creator(&self, wallet: &str, limit: usize) -> StoreResult<Vec<NftRecord>> {
        let table = self.table.clone();
        let wallet = wallet.to_string();
        self.datastore.run(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {NFT_COLUMNS} FROM {table} WHERE creator_wallet = ?1 \
                 ORDER BY created_at DESC, rowid DESC LIMIT ?2"
            ))?;
            let mut rows = stmt.query(params![wallet, limit as i64])?;
            let mut records = Vec::new();
            while let Some(row) = rows.next()? {
                records.push(Self::decode(&table, row)?);
            }
            Ok(records)
        })
        .await
    }
}

// ============================================================
// Wallets
// ============================================================

/// SQLite implementation of WalletRepository
pub struct SqliteWalletRepository {
    datastore: SqliteDatastore,
    table: String,
}

impl SqliteWalletRepository {
    /// Create a new repository
    pub fn new(datastore: SqliteDatastore) -> Self {
        Self {
            table: datastore.table(schema::WALLETS),
            datastore,
        }
    }
}

#[async_trait]
impl WalletRepository for SqliteWalletRepository {
    async fn upsert(&self, binding: WalletBinding) -> StoreResult<()> {
        let table = self.table.clone();
        self.datastore.run(move |conn| {
            conn.execute(
                &format!(
                    "INSERT INTO {table} (user_id, address, wallet_type, network, connected_at) \
                     VALUES (?1, ?2, ?3, ?4, ?5) \
                     ON CONFLICT(user_id) DO UPDATE SET address = excluded.address, \
                     wallet_type = excluded.wallet_type, network = excluded.network, \
                     connected_at = excluded.connected_at"
                ),
                params![
                    user_param(binding.user_id),
                    binding.address,
                    binding.wallet_type,
                    binding.network.as_str(),
                    format_ts(&binding.connected_at),
                ],
            )?;
            Ok(())
        })
        .await
    }

    async fn get(&self, user_id: UserId) -> StoreResult<Option<WalletBinding>> {
        let table = self.table.clone();
        self.datastore.run(move |conn| {
            let row = conn
                .query_row(
                    &format!(
                        "SELECT address, wallet_type, network, connected_at FROM {table} WHERE user_id = ?1"
                    ),
                    params![user_param(user_id)],
                    |row| {
                        Ok((
                            row.get::<_, String>(0)?,
                            row.get::<_, String>(1)?,
                            row.get::<_, String>(2)?,
                            row.get::<_, String>(3)?,
                        ))
                    },
                )
                .optional()?;
            row.map(|(address, wallet_type, network, connected_at)| {
                Ok(WalletBinding {
                    user_id,
                    address,
                    wallet_type,
                    network: Network::parse(&network),
                    connected_at: parse_ts(&table, &connected_at)?,
                })
            })
            .transpose()
        })
        .await
    }

    async fn delete(&self, user_id: UserId) -> StoreResult<bool> {
        let table = self.table.clone();
        self.datastore.run(move |conn| {
            let deleted = conn.execute(
                &format!("DELETE FROM {table} WHERE user_id = ?1"),
                params![user_param(user_id)],
            )?;
            Ok(deleted > 0)
        })
        .await
    }
}

// ============================================================
// HURAII image library
// ============================================================

const IMAGE_COLUMNS: &str = "id, user_id, title, image_url, meta, engine, ai_generated, \
                             blockchain_verified, nft_ready, nft_metadata, created_at";

/// SQLite implementation of ImageRepository
pub struct SqliteImageRepository {
    datastore: SqliteDatastore,
    images: String,
    history: String,
}

impl SqliteImageRepository {
    /// Create a new repository
    pub fn new(datastore: SqliteDatastore) -> Self {
        Self {
            images: datastore.table(schema::IMAGES),
            history: datastore.table(schema::IMAGE_HISTORY),
            datastore,
        }
    }

    fn decode(table: &str, row: &Row<'_>) -> StoreResult<LibraryImage> {
        let meta: String = row.get(4)?;
        let nft_metadata: Option<String> = row.get(9)?;
        let created_at: String = row.get(10)?;
        Ok(LibraryImage {
            id: row.get(0)?,
            user_id: user_from(row.get(1)?),
            title: row.get(2)?,
            image_url: row.get(3)?,
            meta: serde_json::from_str(&meta)
                .map_err(|e| StoreError::corrupt(table, format!("meta: {e}")))?,
            engine: row.get(5)?,
            ai_generated: row.get(6)?,
            blockchain_verified: row.get(7)?,
            nft_ready: row.get(8)?,
            nft_metadata: nft_metadata
                .map(|raw| serde_json::from_str::<NftFromImage>(&raw))
                .transpose()
                .map_err(|e| StoreError::corrupt(table, format!("nft_metadata: {e}")))?,
            created_at: parse_ts(table, &created_at)?,
        })
    }

    async fn select_one(&self, id: i64) -> StoreResult<Option<LibraryImage>> {
        let table = self.images.clone();
        self.datastore.run(move |conn| {
            let mut stmt = conn.prepare(&format!("SELECT {IMAGE_COLUMNS} FROM {table} WHERE id = ?1"))?;
            let mut rows = stmt.query(params![id])?;
            match rows.next()? {
                Some(row) => Ok(Some(Self::decode(&table, row)?)),
                None => Ok(None),
            }
        })
        .await
    }
}

#[async_trait]
impl ImageRepository for SqliteImageRepository {
    async fn insert(&self, image: NewLibraryImage) -> StoreResult<LibraryImage> {
        let table = self.images.clone();
        let meta = serde_json::to_string(&image.meta)?;
        let id = self.datastore.run(move |conn| {
            conn.execute(
                &format!(
                    "INSERT INTO {table} (user_id, title, image_url, meta, engine, ai_generated, \
                     blockchain_verified, nft_ready, created_at) \
                     VALUES (?1, ?2, ?3, ?4, ?5, 1, 0, 0, ?6)"
                ),
                params![
                    user_param(image.user_id),
                    image.title,
                    image.image_url,
                    meta,
                    HURAII_ENGINE,
                    format_ts(&image.created_at),
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await?;
        self.select_one(id)
            .await?
            .ok_or_else(|| StoreError::not_found("LibraryImage", id.to_string()))
    }

    async fn get(&self, id: i64) -> StoreResult<Option<LibraryImage>> {
        self.select_one(id).await
    }

    async fn list_for_user(
        &self,
        user_id: UserId,
        offset: usize,
        limit: usize,
    ) -> StoreResult<(Vec<LibraryImage>, u64)> {
        let table = self.images.clone();
        self.datastore.run(move |conn| {
            let total: i64 = conn.query_row(
                &format!("SELECT COUNT(*) FROM {table} WHERE user_id = ?1 AND ai_generated = 1"),
                params![user_param(user_id)],
                |row| row.get(0),
            )?;

            let mut stmt = conn.prepare(&format!(
                "SELECT {IMAGE_COLUMNS} FROM {table} WHERE user_id = ?1 AND ai_generated = 1 \
                 ORDER BY created_at DESC, id DESC LIMIT ?2 OFFSET ?3"
            ))?;
            let offset = i64::try_from(offset).unwrap_or(i64::MAX);
            let limit = i64::try_from(limit).unwrap_or(i64::MAX);
            let mut rows = stmt.query(params![user_param(user_id), limit, offset])?;
            let mut images = Vec::new();
            while let Some(row) = rows.next()? {
                images.push(Self::decode(&table, row)?);
            }
            Ok((images, u64::try_from(total).unwrap_or_default()))
        })
        .await
    }

    async fn mark_nft_ready(&self, id: i64, metadata: &NftFromImage) -> StoreResult<()> {
        let table = self.images.clone();
        let raw = serde_json::to_string(metadata)?;
        self.datastore.run(move |conn| {
            let updated = conn.execute(
                &format!("UPDATE {table} SET nft_ready = 1, nft_metadata = ?1 WHERE id = ?2"),
                params![raw, id],
            )?;
            if updated == 0 {
                return Err(StoreError::not_found("LibraryImage", id.to_string()));
            }
            Ok(())
        })
        .await
    }

    async fn push_history(&self, user_id: UserId, item: HistoryItem, cap: usize) -> StoreResult<()> {
        let table = self.history.clone();
        self.datastore.run_tx(move |conn| {
            conn.execute(
                &format!(
                    "INSERT INTO {table} (user_id, image_id, url, description, mode, date) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)"
                ),
                params![
                    user_param(user_id),
                    item.id,
                    item.url,
                    item.description,
                    item.mode,
                    item.date
                ],
            )?;
            conn.execute(
                &format!(
                    "DELETE FROM {table} WHERE user_id = ?1 AND id NOT IN \
                     (SELECT id FROM {table} WHERE user_id = ?1 ORDER BY id DESC LIMIT ?2)"
                ),
                params![user_param(user_id), cap as i64],
            )?;
            Ok(())
        })
        .await
    }

    async fn history(&self, user_id: UserId) -> StoreResult<Vec<HistoryItem>> {
        let table = self.history.clone();
        self.datastore.run(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT image_id, url, description, mode, date FROM {table} \
                 WHERE user_id = ?1 ORDER BY id DESC"
            ))?;
            let rows = stmt.query_map(params![user_param(user_id)], |row| {
                Ok(HistoryItem {
                    id: row.get(0)?,
                    url: row.get(1)?,
                    description: row.get(2)?,
                    mode: row.get(3)?,
                    date: row.get(4)?,
                })
            })?;
            Ok(rows.collect::<Result<Vec<_>, _>>()?)
        })
        .await
    }
}
