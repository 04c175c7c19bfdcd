//! SQLite Ledger Repository Implementation
//!
//! The ledger append runs as one `BEGIN IMMEDIATE` transaction: the
//! idempotency lookup, the balance read, the balance check, the ledger insert
//! and both points entries either all land or none do. Concurrent spends
//! against the same balance serialize on the write lock.

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use rust_decimal::Decimal;
use vortex_core::{
    Currency, NewTransaction, PointsEntry, TransactionRecord, TransactionStatus, TransactionType,
    UserId,
};

use crate::datastore::{format_ts, parse_decimal, parse_ts, user_from, user_param, SqliteDatastore};
use crate::error::{StoreError, StoreResult};
use crate::repos::{AppendOutcome, LedgerRepository};
use crate::schema;

const TX_COLUMNS: &str = "id, sender_id, recipient_id, amount, fee, sender_fee, recipient_fee, \
                          type, item_id, currency, status, idempotency_key, created_at";

/// Raw ledger row before decimal/timestamp decoding
struct TxRow {
    id: i64,
    sender_id: i64,
    recipient_id: i64,
    amount: String,
    fee: String,
    sender_fee: String,
    recipient_fee: String,
    tx_type: String,
    item_id: Option<i64>,
    currency: String,
    idempotency_key: Option<String>,
    created_at: String,
}

impl TxRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            sender_id: row.get(1)?,
            recipient_id: row.get(2)?,
            amount: row.get(3)?,
            fee: row.get(4)?,
            sender_fee: row.get(5)?,
            recipient_fee: row.get(6)?,
            tx_type: row.get(7)?,
            item_id: row.get(8)?,
            currency: row.get(9)?,
            idempotency_key: row.get(11)?,
            created_at: row.get(12)?,
        })
    }

    fn decode(self, table: &str) -> StoreResult<TransactionRecord> {
        let currency = Currency::parse(&self.currency)
            .ok_or_else(|| StoreError::corrupt(table, format!("currency {}", self.currency)))?;
        Ok(TransactionRecord {
            id: self.id,
            sender_id: user_from(self.sender_id),
            recipient_id: user_from(self.recipient_id),
            amount: parse_decimal(table, &self.amount)?,
            fee: parse_decimal(table, &self.fee)?,
            sender_fee: parse_decimal(table, &self.sender_fee)?,
            recipient_fee: parse_decimal(table, &self.recipient_fee)?,
            tx_type: TransactionType::parse(&self.tx_type),
            item_id: self.item_id,
            currency,
            status: TransactionStatus::Completed,
            idempotency_key: self.idempotency_key,
            created_at: parse_ts(table, &self.created_at)?,
        })
    }
}

/// SQLite implementation of LedgerRepository
pub struct SqliteLedgerRepository {
    datastore: SqliteDatastore,
    transactions: String,
    points: String,
}

impl SqliteLedgerRepository {
    /// Create a new repository
    pub fn new(datastore: SqliteDatastore) -> Self {
        Self {
            transactions: datastore.table(schema::TRANSACTIONS),
            points: datastore.table(schema::TOLA_POINTS),
            datastore,
        }
    }

    fn sum_points(conn: &Connection, table: &str, user_id: UserId) -> StoreResult<Decimal> {
        let mut stmt = conn.prepare(&format!("SELECT points FROM {table} WHERE user_id = ?1"))?;
        let rows = stmt.query_map(params![user_param(user_id)], |row| row.get::<_, String>(0))?;
        let mut total = Decimal::ZERO;
        for raw in rows {
            total += parse_decimal(table, &raw?)?;
        }
        Ok(total)
    }

    fn find_by_key(
        conn: &Connection,
        table: &str,
        key: &str,
    ) -> StoreResult<Option<(TransactionRecord, String)>> {
        let found = conn
            .query_row(
                &format!("SELECT {TX_COLUMNS}, fingerprint FROM {table} WHERE idempotency_key = ?1"),
                params![key],
                |row| Ok((TxRow::from_row(row)?, row.get::<_, String>(13)?)),
            )
            .optional()?;
        found
            .map(|(row, fingerprint)| Ok((row.decode(table)?, fingerprint)))
            .transpose()
    }

    fn insert_points(
        conn: &Connection,
        table: &str,
        user_id: UserId,
        points: Decimal,
        reason: &str,
        transaction_ref: Option<i64>,
        created_at: &str,
    ) -> StoreResult<i64> {
        conn.execute(
            &format!(
                "INSERT INTO {table} (user_id, points, reason, transaction_ref, created_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5)"
            ),
            params![
                user_param(user_id),
                points.to_string(),
                reason,
                transaction_ref,
                created_at
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }
}

#[async_trait]
impl LedgerRepository for SqliteLedgerRepository {
    async fn append_transaction(&self, tx: NewTransaction) -> StoreResult<AppendOutcome> {
        let transactions = self.transactions.clone();
        let points = self.points.clone();

        self.datastore.run_tx(move |conn| {
            if let Some(key) = tx.idempotency_key.as_deref() {
                if let Some((existing, fingerprint)) = Self::find_by_key(conn, &transactions, key)? {
                    if fingerprint == tx.fingerprint {
                        return Ok(AppendOutcome::Replayed(existing));
                    }
                    return Err(StoreError::IdempotencyConflict {
                        key: key.to_string(),
                    });
                }
            }

            let required = tx.amount + tx.fees.sender_fee;
            let available = Self::sum_points(conn, &points, tx.sender_id)?;
            if available < required {
                return Err(StoreError::InsufficientBalance {
                    required,
                    available,
                });
            }

            let created_at = format_ts(&tx.created_at);
            conn.execute(
                &format!(
                    "INSERT INTO {transactions} (sender_id, recipient_id, amount, fee, sender_fee, \
                     recipient_fee, type, item_id, currency, status, idempotency_key, fingerprint, created_at) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)"
                ),
                params![
                    user_param(tx.sender_id),
                    user_param(tx.recipient_id),
                    tx.amount.to_string(),
                    tx.fees.fee.to_string(),
                    tx.fees.sender_fee.to_string(),
                    tx.fees.recipient_fee.to_string(),
                    tx.tx_type.as_str(),
                    tx.item_id,
                    Currency::Tola.as_str(),
                    TransactionStatus::Completed.as_str(),
                    tx.idempotency_key,
                    tx.fingerprint,
                    created_at,
                ],
            )?;
            let id = conn.last_insert_rowid();

            let reason = format!("transaction:{}", tx.tx_type);
            Self::insert_points(conn, &points, tx.sender_id, -required, &reason, Some(id), &created_at)?;
            Self::insert_points(
                conn,
                &points,
                tx.recipient_id,
                tx.amount - tx.fees.recipient_fee,
                &reason,
                Some(id),
                &created_at,
            )?;

            let record = conn
                .query_row(
                    &format!("SELECT {TX_COLUMNS} FROM {transactions} WHERE id = ?1"),
                    params![id],
                    TxRow::from_row,
                )?
                .decode(&transactions)?;
            Ok(AppendOutcome::Inserted(record))
        })
        .await
    }

    async fn get_transaction(&self, id: i64) -> StoreResult<Option<TransactionRecord>> {
        let table = self.transactions.clone();
        self.datastore
            .run(move |conn| {
                conn.query_row(
                    &format!("SELECT {TX_COLUMNS} FROM {table} WHERE id = ?1"),
                    params![id],
                    TxRow::from_row,
                )
                .optional()?
                .map(|row| row.decode(&table))
                .transpose()
            })
            .await
    }

    async fn list_for_user(
        &self,
        user_id: UserId,
        limit: usize,
    ) -> StoreResult<Vec<TransactionRecord>> {
        let table = self.transactions.clone();
        self.datastore
            .run(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {TX_COLUMNS} FROM {table} WHERE sender_id = ?1 OR recipient_id = ?1 \
                     ORDER BY id DESC LIMIT ?2"
                ))?;
                let rows =
                    stmt.query_map(params![user_param(user_id), limit as i64], TxRow::from_row)?;
                let mut records = Vec::new();
                for row in rows {
                    records.push(row?.decode(&table)?);
                }
                Ok(records)
            })
            .await
    }

    async fn balance(&self, user_id: UserId) -> StoreResult<Decimal> {
        let table = self.points.clone();
        self.datastore
            .run(move |conn| Self::sum_points(conn, &table, user_id))
            .await
    }

    async fn award_points(
        &self,
        user_id: UserId,
        points: Decimal,
        reason: &str,
    ) -> StoreResult<PointsEntry> {
        let table = self.points.clone();
        let created_at = format_ts(&Utc::now());
        let reason = reason.to_string();
        let (id, table, created_at, reason) = self
            .datastore
            .run(move |conn| {
                let id =
                    Self::insert_points(conn, &table, user_id, points, &reason, None, &created_at)?;
                Ok((id, table, created_at, reason))
            })
            .await?;
        Ok(PointsEntry {
            id,
            user_id,
            points,
            reason,
            transaction_ref: None,
            created_at: parse_ts(&table, &created_at)?,
        })
    }

    async fn points_history(&self, user_id: UserId, limit: usize) -> StoreResult<Vec<PointsEntry>> {
        let table = self.points.clone();
        self.datastore.run(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT id, user_id, points, reason, transaction_ref, created_at FROM {table} \
                 WHERE user_id = ?1 ORDER BY id DESC LIMIT ?2"
            ))?;
            let rows = stmt.query_map(params![user_param(user_id), limit as i64], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, Option<i64>>(4)?,
                    row.get::<_, String>(5)?,
                ))
            })?;
            let mut entries = Vec::new();
            for row in rows {
                let (id, user, points, reason, transaction_ref, created_at) = row?;
                entries.push(PointsEntry {
                    id,
                    user_id: user_from(user),
                    points: parse_decimal(&table, &points)?,
                    reason,
                    transaction_ref,
                    created_at: parse_ts(&table, &created_at)?,
                });
            }
            Ok(entries)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vortex_core::{FeeArrangement, FeeSchedule, TransactionRequest};

    async fn repo() -> SqliteLedgerRepository {
        let ds = SqliteDatastore::in_memory().unwrap();
        ds.init_schema().await.unwrap();
        SqliteLedgerRepository::new(ds)
    }

    fn new_tx(request: &TransactionRequest) -> NewTransaction {
        NewTransaction {
            sender_id: request.sender_id,
            recipient_id: request.recipient_id,
            amount: request.amount,
            fees: FeeSchedule::default().compute(&request.tx_type, request.fee_arrangement),
            tx_type: request.tx_type.clone(),
            item_id: request.item_id,
            idempotency_key: request.idempotency_key.clone(),
            fingerprint: request.fingerprint(),
            created_at: Utc::now(),
        }
    }

    fn purchase(amount: i64) -> TransactionRequest {
        TransactionRequest::new(
            TransactionType::NftPurchase,
            UserId(1),
            UserId(2),
            Decimal::new(amount, 0),
        )
        .with_fee_arrangement(FeeArrangement::SenderPays)
    }

    #[tokio::test]
    async fn test_balance_defaults_to_zero() {
        assert_eq!(repo().await.balance(UserId(42)).await.unwrap(), Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_append_moves_points() {
        let repo = repo().await;
        repo.award_points(UserId(1), Decimal::new(1000, 0), "seed").await.unwrap();

        let outcome = repo.append_transaction(new_tx(&purchase(50))).await.unwrap();
        let record = outcome.record();
        assert!(!outcome.is_replay());
        assert_eq!(record.fee, Decimal::new(89, 0));
        assert_eq!(record.sender_fee, Decimal::new(89, 0));
        assert_eq!(record.recipient_fee, Decimal::ZERO);
        assert_eq!(record.currency, Currency::Tola);
        assert_eq!(record.status, TransactionStatus::Completed);

        assert_eq!(repo.balance(UserId(1)).await.unwrap(), Decimal::new(861, 0));
        assert_eq!(repo.balance(UserId(2)).await.unwrap(), Decimal::new(50, 0));

        let history = repo.points_history(UserId(1), 10).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].transaction_ref, Some(record.id));
    }

    #[tokio::test]
    async fn test_insufficient_balance_writes_nothing() {
        let repo = repo().await;
        repo.award_points(UserId(1), Decimal::new(100, 0), "seed").await.unwrap();

        let err = repo.append_transaction(new_tx(&purchase(50))).await.unwrap_err();
        match err {
            StoreError::InsufficientBalance { required, available } => {
                assert_eq!(required, Decimal::new(139, 0));
                assert_eq!(available, Decimal::new(100, 0));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(repo.list_for_user(UserId(1), 10).await.unwrap().is_empty());
        assert_eq!(repo.balance(UserId(1)).await.unwrap(), Decimal::new(100, 0));
    }

    #[tokio::test]
    async fn test_idempotent_replay_and_conflict() {
        let repo = repo().await;
        repo.award_points(UserId(1), Decimal::new(1000, 0), "seed").await.unwrap();

        let request = purchase(50).with_idempotency_key("order-7");
        let first = repo.append_transaction(new_tx(&request)).await.unwrap();
        let again = repo.append_transaction(new_tx(&request)).await.unwrap();
        assert!(again.is_replay());
        assert_eq!(first.record().id, again.record().id);
        assert_eq!(repo.list_for_user(UserId(1), 10).await.unwrap().len(), 1);

        let changed = purchase(60).with_idempotency_key("order-7");
        let err = repo.append_transaction(new_tx(&changed)).await.unwrap_err();
        assert!(matches!(err, StoreError::IdempotencyConflict { .. }));
    }

    #[tokio::test]
    async fn test_get_transaction_required() {
        let repo = repo().await;
        assert!(repo.get_transaction(99).await.unwrap().is_none());
        assert!(matches!(
            repo.get_transaction_required(99).await,
            Err(StoreError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_concurrent_spends_cannot_overdraw() {
        let repo = std::sync::Arc::new(repo().await);
        repo.award_points(UserId(1), Decimal::new(150, 0), "seed").await.unwrap();

        // Each spend needs 139; only one fits
        let mut handles = Vec::new();
        for _ in 0..4 {
            let repo = repo.clone();
            handles.push(tokio::spawn(async move {
                repo.append_transaction(new_tx(&purchase(50))).await
            }));
        }
        let mut ok = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                ok += 1;
            }
        }
        assert_eq!(ok, 1);
        assert_eq!(repo.balance(UserId(1)).await.unwrap(), Decimal::new(11, 0));
    }
}
