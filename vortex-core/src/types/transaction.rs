//! Transaction Ledger Types

use super::common::{Currency, UserId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Transaction type. Anything unrecognized is carried verbatim as `Other`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TransactionType {
    ArtistSwap,
    NftPurchase,
    Other(String),
}

impl TransactionType {
    pub fn parse(s: &str) -> Self {
        match s {
            "artist_swap" => TransactionType::ArtistSwap,
            "nft_purchase" => TransactionType::NftPurchase,
            other => TransactionType::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            TransactionType::ArtistSwap => "artist_swap",
            TransactionType::NftPurchase => "nft_purchase",
            TransactionType::Other(s) => s,
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for TransactionType {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for TransactionType {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let s = String::deserialize(d)?;
        Ok(TransactionType::parse(&s))
    }
}

/// Who pays the transaction fee
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FeeArrangement {
    SenderPays,
    RecipientPays,
    #[default]
    Split,
}

impl FeeArrangement {
    /// Unknown arrangements fall back to `Split`
    pub fn parse_lenient(s: &str) -> Self {
        match s {
            "sender_pays" => FeeArrangement::SenderPays,
            "recipient_pays" => FeeArrangement::RecipientPays,
            _ => FeeArrangement::Split,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FeeArrangement::SenderPays => "sender_pays",
            FeeArrangement::RecipientPays => "recipient_pays",
            FeeArrangement::Split => "split",
        }
    }
}

impl<'de> Deserialize<'de> for FeeArrangement {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let s = String::deserialize(d)?;
        Ok(FeeArrangement::parse_lenient(&s))
    }
}

/// Ledger row status. Rows are written once as `Completed`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Completed,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Completed => "completed",
        }
    }
}

/// Computed fee breakdown. `sender_fee + recipient_fee == fee` always.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeBreakdown {
    pub fee: Decimal,
    pub sender_fee: Decimal,
    pub recipient_fee: Decimal,
}

/// Incoming transaction request
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TransactionRequest {
    pub tx_type: TransactionType,
    pub sender_id: UserId,
    pub recipient_id: UserId,
    pub amount: Decimal,
    pub item_id: Option<i64>,
    /// Raw currency as submitted; validated before anything else
    pub currency: String,
    pub fee_arrangement: FeeArrangement,
    pub idempotency_key: Option<String>,
    /// Client IP for the audit log
    pub client_ip: Option<String>,
}

impl TransactionRequest {
    pub fn new(
        tx_type: TransactionType,
        sender_id: UserId,
        recipient_id: UserId,
        amount: Decimal,
    ) -> Self {
        Self {
            tx_type,
            sender_id,
            recipient_id,
            amount,
            item_id: None,
            currency: Currency::Tola.to_string(),
            fee_arrangement: FeeArrangement::default(),
            idempotency_key: None,
            client_ip: None,
        }
    }

    pub fn with_item(mut self, item_id: i64) -> Self {
        self.item_id = Some(item_id);
        self
    }

    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }

    pub fn with_fee_arrangement(mut self, arrangement: FeeArrangement) -> Self {
        self.fee_arrangement = arrangement;
        self
    }

    pub fn with_idempotency_key(mut self, key: impl Into<String>) -> Self {
        self.idempotency_key = Some(key.into());
        self
    }

    pub fn with_client_ip(mut self, ip: impl Into<String>) -> Self {
        self.client_ip = Some(ip.into());
        self
    }

    /// Digest of the economically relevant parameters, used to detect
    /// idempotency key reuse with different inputs.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.tx_type.as_str().as_bytes());
        hasher.update(b"|");
        hasher.update(self.sender_id.0.to_be_bytes());
        hasher.update(b"|");
        hasher.update(self.recipient_id.0.to_be_bytes());
        hasher.update(b"|");
        hasher.update(self.amount.normalize().to_string().as_bytes());
        hasher.update(b"|");
        hasher.update(self.item_id.unwrap_or_default().to_be_bytes());
        hasher.update(b"|");
        hasher.update(self.currency.as_bytes());
        hasher.update(b"|");
        hasher.update(self.fee_arrangement.as_str().as_bytes());
        hex::encode(hasher.finalize())
    }
}

/// Persisted ledger row (append-only)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub id: i64,
    pub sender_id: UserId,
    pub recipient_id: UserId,
    pub amount: Decimal,
    pub fee: Decimal,
    pub sender_fee: Decimal,
    pub recipient_fee: Decimal,
    pub tx_type: TransactionType,
    pub item_id: Option<i64>,
    pub currency: Currency,
    pub status: TransactionStatus,
    pub idempotency_key: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TransactionRecord {
    /// Amount leaving the sender's balance
    pub fn total_debited(&self) -> Decimal {
        self.amount + self.sender_fee
    }

    /// Amount credited to the recipient
    pub fn net_credited(&self) -> Decimal {
        self.amount - self.recipient_fee
    }
}

/// Row to append, before the store assigns an id
#[derive(Clone, Debug)]
pub struct NewTransaction {
    pub sender_id: UserId,
    pub recipient_id: UserId,
    pub amount: Decimal,
    pub fees: FeeBreakdown,
    pub tx_type: TransactionType,
    pub item_id: Option<i64>,
    pub idempotency_key: Option<String>,
    pub fingerprint: String,
    pub created_at: DateTime<Utc>,
}

/// Result handed back to callers of `process_transaction`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransactionReceipt {
    pub transaction_id: i64,
    pub fee: Decimal,
    pub sender_fee: Decimal,
    pub recipient_fee: Decimal,
    pub total_debited: Decimal,
    pub currency: Currency,
    pub status: TransactionStatus,
    /// True when an idempotent replay returned an existing row
    pub replayed: bool,
}

impl TransactionReceipt {
    pub fn from_record(record: &TransactionRecord, replayed: bool) -> Self {
        Self {
            transaction_id: record.id,
            fee: record.fee,
            sender_fee: record.sender_fee,
            recipient_fee: record.recipient_fee,
            total_debited: record.total_debited(),
            currency: record.currency,
            status: record.status,
            replayed,
        }
    }
}

/// Points ledger row. Balance is the sum of `points` over a user's rows.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PointsEntry {
    pub id: i64,
    pub user_id: UserId,
    pub points: Decimal,
    pub reason: String,
    pub transaction_ref: Option<i64>,
    pub created_at: DateTime<Utc>,
}
