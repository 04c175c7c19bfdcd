//! Ledger Repository

use async_trait::async_trait;
use rust_decimal::Decimal;
use vortex_core::{NewTransaction, PointsEntry, TransactionRecord, UserId};

use crate::error::{StoreError, StoreResult};

/// Result of an append
#[derive(Clone, Debug, PartialEq)]
pub enum AppendOutcome {
    /// A new row was written
    Inserted(TransactionRecord),
    /// The idempotency key matched an identical earlier request
    Replayed(TransactionRecord),
}

impl AppendOutcome {
    pub fn record(&self) -> &TransactionRecord {
        match self {
            AppendOutcome::Inserted(r) | AppendOutcome::Replayed(r) => r,
        }
    }

    pub fn is_replay(&self) -> bool {
        matches!(self, AppendOutcome::Replayed(_))
    }
}

/// Transaction ledger + points repository trait
#[async_trait]
pub trait LedgerRepository: Send + Sync {
    /// Atomically check the sender balance and append the ledger row plus
    /// the matching points entries.
    ///
    /// Fails with [`StoreError::InsufficientBalance`] when
    /// `balance < amount + sender_fee`, and with
    /// [`StoreError::IdempotencyConflict`] when the key is bound to a
    /// different fingerprint. Nothing is written on failure.
    async fn append_transaction(&self, tx: NewTransaction) -> StoreResult<AppendOutcome>;

    /// Get transaction by ID
    async fn get_transaction(&self, id: i64) -> StoreResult<Option<TransactionRecord>>;

    /// Get transaction by ID, error if not found
    async fn get_transaction_required(&self, id: i64) -> StoreResult<TransactionRecord> {
        self.get_transaction(id)
            .await?
            .ok_or_else(|| StoreError::not_found("Transaction", id.to_string()))
    }

    /// Transactions where the user is sender or recipient, newest first
    async fn list_for_user(&self, user_id: UserId, limit: usize)
        -> StoreResult<Vec<TransactionRecord>>;

    /// `SUM(points)` for the user; zero without rows
    async fn balance(&self, user_id: UserId) -> StoreResult<Decimal>;

    /// Append a points entry outside any transaction (awards, adjustments)
    async fn award_points(
        &self,
        user_id: UserId,
        points: Decimal,
        reason: &str,
    ) -> StoreResult<PointsEntry>;

    /// Points history, newest first
    async fn points_history(&self, user_id: UserId, limit: usize) -> StoreResult<Vec<PointsEntry>>;
}
