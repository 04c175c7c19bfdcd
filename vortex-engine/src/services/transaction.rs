//! TOLA Transaction Service
//!
//! Validates a transfer, prices it from the static fee table and appends it
//! to the ledger. The balance check and the insert run in one immediate
//! SQLite transaction inside the ledger repository, so two concurrent spends
//! against the same balance cannot both pass.

use chrono::Utc;
use metrics::counter;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use vortex_core::{
    Currency, EventBus, FeeSchedule, MarketEvent, NewTransaction, PointsEntry, TransactionReceipt,
    TransactionRecord, TransactionRequest, UserId, VortexError,
};
use vortex_store::LedgerRepository;

use crate::error::EngineResult;

/// Default page size for ledger listings
pub const DEFAULT_LIST_LIMIT: usize = 50;

/// Transaction service
pub struct TransactionService {
    ledger: Arc<dyn LedgerRepository>,
    fees: FeeSchedule,
    events: Arc<EventBus>,
}

impl TransactionService {
    pub fn new(ledger: Arc<dyn LedgerRepository>, events: Arc<EventBus>) -> Self {
        Self {
            ledger,
            fees: FeeSchedule::default(),
            events,
        }
    }

    /// Replace the fee table
    pub fn with_fee_schedule(mut self, fees: FeeSchedule) -> Self {
        self.fees = fees;
        self
    }

    pub fn fee_schedule(&self) -> &FeeSchedule {
        &self.fees
    }

    /// Process a TOLA transfer
    ///
    /// Checks run in order: currency, amount, parties, then the recipient
    /// fee against the amount. Nothing touches the ledger until all pass.
    #[instrument(skip(self, request), fields(tx_type = %request.tx_type))]
    pub async fn process_transaction(
        &self,
        request: TransactionRequest,
    ) -> EngineResult<TransactionReceipt> {
        let tx_type = request.tx_type.as_str().to_string();
        match self.execute(request).await {
            Ok(receipt) => {
                let status = if receipt.replayed { "replayed" } else { "completed" };
                counter!("vortex_transactions_total", "type" => tx_type, "status" => status)
                    .increment(1);
                Ok(receipt)
            }
            Err(e) => {
                counter!("vortex_transactions_total", "type" => tx_type, "status" => "rejected")
                    .increment(1);
                Err(e)
            }
        }
    }

    async fn execute(&self, request: TransactionRequest) -> EngineResult<TransactionReceipt> {
        if Currency::parse(&request.currency).is_none() {
            return Err(VortexError::InvalidCurrency {
                currency: request.currency.clone(),
            }
            .into());
        }

        if request.amount <= Decimal::ZERO {
            return Err(VortexError::InvalidAmount {
                reason: "amount must be greater than zero".to_string(),
            }
            .into());
        }

        if request.sender_id.is_anonymous() {
            return Err(VortexError::not_logged_in("process transactions").into());
        }
        if request.recipient_id.is_anonymous() {
            return Err(VortexError::missing("recipient_id").into());
        }
        if request.sender_id == request.recipient_id {
            return Err(VortexError::SelfTransfer.into());
        }

        let fees = self.fees.compute(&request.tx_type, request.fee_arrangement);
        if request.amount < fees.recipient_fee {
            return Err(VortexError::InvalidAmount {
                reason: format!(
                    "amount must cover the recipient fee of {}",
                    fees.recipient_fee
                ),
            }
            .into());
        }
        let new_tx = NewTransaction {
            sender_id: request.sender_id,
            recipient_id: request.recipient_id,
            amount: request.amount,
            fees,
            tx_type: request.tx_type.clone(),
            item_id: request.item_id,
            idempotency_key: request.idempotency_key.clone(),
            fingerprint: request.fingerprint(),
            created_at: Utc::now(),
        };

        let outcome = match self.ledger.append_transaction(new_tx).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(
                    sender = %request.sender_id,
                    recipient = %request.recipient_id,
                    amount = %request.amount,
                    error = %e,
                    "TOLA transaction rejected"
                );
                return Err(e.into());
            }
        };

        let record = outcome.record();
        if outcome.is_replay() {
            info!(transaction_id = record.id, "idempotent replay of TOLA transaction");
            return Ok(TransactionReceipt::from_record(record, true));
        }

        info!(
            target: "vortex_audit",
            transaction_id = record.id,
            sender = %record.sender_id,
            recipient = %record.recipient_id,
            amount = %record.amount,
            fee = %record.fee,
            tx_type = %record.tx_type,
            ip = request.client_ip.as_deref().unwrap_or("unknown"),
            "TOLA transaction completed"
        );

        self.events.publish(&MarketEvent::TransactionCompleted {
            transaction_id: record.id,
            tx_type: record.tx_type.as_str().to_string(),
            sender_id: record.sender_id,
            recipient_id: record.recipient_id,
            amount: record.amount,
            fee: record.fee,
            timestamp: record.created_at,
        });

        Ok(TransactionReceipt::from_record(record, false))
    }

    /// Newest-first transactions where the user is sender or recipient
    pub async fn list_user_transactions(
        &self,
        user_id: UserId,
        limit: usize,
    ) -> EngineResult<Vec<TransactionRecord>> {
        Ok(self.ledger.list_for_user(user_id, limit.max(1)).await?)
    }

    pub async fn get_transaction(&self, id: i64) -> EngineResult<TransactionRecord> {
        Ok(self.ledger.get_transaction_required(id).await?)
    }

    /// Credit (or debit, when negative) points from an external award event
    pub async fn award_points(
        &self,
        user_id: UserId,
        points: Decimal,
        reason: &str,
    ) -> EngineResult<PointsEntry> {
        if user_id.is_anonymous() {
            return Err(VortexError::missing("user_id").into());
        }
        if points.is_zero() {
            return Err(VortexError::InvalidAmount {
                reason: "points must not be zero".to_string(),
            }
            .into());
        }
        let reason = if reason.trim().is_empty() { "award" } else { reason.trim() };
        let entry = self.ledger.award_points(user_id, points, reason).await?;
        info!(user_id = %user_id, points = %points, reason, "TOLA points awarded");
        Ok(entry)
    }

    /// Points rows for a user, newest first
    pub async fn points_history(
        &self,
        user_id: UserId,
        limit: usize,
    ) -> EngineResult<Vec<PointsEntry>> {
        Ok(self.ledger.points_history(user_id, limit.max(1)).await?)
    }
}
