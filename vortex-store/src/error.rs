//! VORTEX Store Error Types

use rust_decimal::Decimal;
use thiserror::Error;
use vortex_core::VortexError;

/// VORTEX Store Result type
pub type StoreResult<T> = Result<T, StoreError>;

/// VORTEX Store Error
#[derive(Debug, Error)]
pub enum StoreError {
    /// Entity not found
    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound { entity_type: String, id: String },

    /// Balance check failed inside the ledger transaction
    #[error("Insufficient balance: required {required}, available {available}")]
    InsufficientBalance { required: Decimal, available: Decimal },

    /// Idempotency key already bound to different parameters
    #[error("Idempotency conflict for key {key}")]
    IdempotencyConflict { key: String },

    /// Stored value could not be decoded
    #[error("Corrupt row in {table}: {message}")]
    CorruptRow { table: String, message: String },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(String),

    /// Connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Transaction error
    #[error("Transaction error: {0}")]
    Transaction(String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

impl StoreError {
    /// Create a not found error
    pub fn not_found(entity_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: entity_type.into(),
            id: id.into(),
        }
    }

    /// Create a corrupt row error
    pub fn corrupt(table: impl Into<String>, message: impl Into<String>) -> Self {
        Self::CorruptRow {
            table: table.into(),
            message: message.into(),
        }
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<StoreError> for VortexError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity_type, id } => VortexError::NotFound {
                entity: entity_type,
                id,
            },
            StoreError::InsufficientBalance {
                required,
                available,
            } => VortexError::InsufficientBalance {
                required,
                available,
            },
            StoreError::IdempotencyConflict { key } => VortexError::IdempotencyConflict { key },
            StoreError::Validation(msg) => VortexError::invalid("input", msg),
            StoreError::Serialization(msg) => VortexError::SerializationError(msg),
            other => VortexError::StorageError(other.to_string()),
        }
    }
}
