//! VORTEX Error Code Registry
//!
//! Error code format: VX-{module}-{sequence}
//! - VX-SEC: Security checks (nonce, unsafe input)
//! - VX-AUTH: Authentication / capability
//! - VX-INPUT: Missing or malformed input
//! - VX-TX: Transaction ledger
//! - VX-WALLET: Wallet and signature
//! - VX-NFT: NFT / image library
//! - VX-LIC: License records
//! - VX-UP: Upstream HTTP API
//!
//! Every variant also maps to a stable snake_case `code()` which is what
//! clients see in `{success:false, data:{code, message}}` envelopes.

use rust_decimal::Decimal;
use thiserror::Error;

/// VORTEX Result type
pub type VortexResult<T> = Result<T, VortexError>;

/// Error category, following the boundary taxonomy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Security,
    Auth,
    Input,
    Domain,
    Upstream,
    Server,
}

/// VORTEX Error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum VortexError {
    // ============================================================
    // Security Errors (VX-SEC-*)
    // ============================================================
    /// [VX-SEC-001] Nonce missing or invalid
    #[error("[VX-SEC-001] Security check failed")]
    SecurityCheckFailed,

    /// [VX-SEC-002] Untrusted URL
    #[error("[VX-SEC-002] Invalid URL: {url}")]
    UnsafeUrl { url: String },

    // ============================================================
    // Auth Errors (VX-AUTH-*)
    // ============================================================
    /// [VX-AUTH-001] No logged-in user
    #[error("[VX-AUTH-001] You must be logged in to {action}")]
    NotLoggedIn { action: String },

    /// [VX-AUTH-002] API key rejected
    #[error("[VX-AUTH-002] Invalid API key")]
    InvalidApiKey,

    // ============================================================
    // Input Errors (VX-INPUT-*)
    // ============================================================
    /// [VX-INPUT-001] Required field missing
    #[error("[VX-INPUT-001] Missing required field: {field}")]
    MissingField { field: String },

    /// [VX-INPUT-002] Field present but invalid
    #[error("[VX-INPUT-002] Invalid {field}: {reason}")]
    InvalidField { field: String, reason: String },

    // ============================================================
    // Transaction Errors (VX-TX-*)
    // ============================================================
    /// [VX-TX-001] Only TOLA is accepted
    #[error("[VX-TX-001] Invalid currency {currency}: only TOLA is supported")]
    InvalidCurrency { currency: String },

    /// [VX-TX-002] Sender cannot cover amount + sender fee
    #[error("[VX-TX-002] Insufficient TOLA balance: required {required}, available {available}")]
    InsufficientBalance { required: Decimal, available: Decimal },

    /// [VX-TX-003] Non-positive amount
    #[error("[VX-TX-003] Invalid amount: {reason}")]
    InvalidAmount { reason: String },

    /// [VX-TX-004] Idempotency key reused with different parameters
    #[error("[VX-TX-004] Idempotency key {key} already used with different parameters")]
    IdempotencyConflict { key: String },

    /// [VX-TX-005] Sender and recipient are the same user
    #[error("[VX-TX-005] Sender and recipient must differ")]
    SelfTransfer,

    // ============================================================
    // Wallet Errors (VX-WALLET-*)
    // ============================================================
    /// [VX-WALLET-001] Address fails network format
    #[error("[VX-WALLET-001] Invalid wallet address {address} for network {network}")]
    InvalidWalletAddress { address: String, network: String },

    /// [VX-WALLET-002] No verifier for the network
    #[error("[VX-WALLET-002] Signature verification not supported for network {network}")]
    UnsupportedNetwork { network: String },

    /// [VX-WALLET-003] Malformed key or signature encoding
    #[error("[VX-WALLET-003] Invalid signature encoding: {reason}")]
    InvalidSignatureEncoding { reason: String },

    // ============================================================
    // NFT Errors (VX-NFT-*)
    // ============================================================
    /// [VX-NFT-001] Platform wallet not configured
    #[error("[VX-NFT-001] Platform wallet not configured")]
    PlatformWalletMissing,

    /// [VX-NFT-002] Image is not a library image owned by the user
    #[error("[VX-NFT-002] Not a valid AI image: {image_id}")]
    InvalidImage { image_id: i64 },

    // ============================================================
    // License Errors (VX-LIC-*)
    // ============================================================
    /// [VX-LIC-001] Bad key format
    #[error("[VX-LIC-001] Invalid license key format")]
    InvalidLicenseFormat,

    /// [VX-LIC-002] Nothing to deactivate
    #[error("[VX-LIC-002] No license key found")]
    LicenseNotFound,

    // ============================================================
    // Upstream Errors (VX-UP-*)
    // ============================================================
    /// [VX-UP-001] Client has no API key configured
    #[error("[VX-UP-001] API key is not configured")]
    MissingApiKey,

    /// [VX-UP-002] Upstream returned HTTP >= 400
    #[error("[VX-UP-002] Upstream API error {status}: {message}")]
    Upstream { status: u16, message: String },

    // ============================================================
    // General Errors
    // ============================================================
    /// Entity not found
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Storage error
    #[error("Storage error: {0}")]
    StorageError(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl VortexError {
    /// Stable client-facing code
    pub fn code(&self) -> &'static str {
        match self {
            VortexError::SecurityCheckFailed | VortexError::UnsafeUrl { .. } => "security_error",
            VortexError::NotLoggedIn { .. } => "auth_error",
            VortexError::InvalidApiKey => "invalid_api_key",
            VortexError::MissingField { .. } | VortexError::InvalidField { .. } => "input_error",
            VortexError::InvalidCurrency { .. } => "invalid_currency",
            VortexError::InsufficientBalance { .. } => "insufficient_balance",
            VortexError::InvalidAmount { .. } => "invalid_amount",
            VortexError::IdempotencyConflict { .. } => "idempotency_conflict",
            VortexError::SelfTransfer => "invalid_recipient",
            VortexError::InvalidWalletAddress { .. } => "invalid_wallet_address",
            VortexError::UnsupportedNetwork { .. } => "unsupported_network",
            VortexError::InvalidSignatureEncoding { .. } => "invalid_signature",
            VortexError::PlatformWalletMissing => "platform_wallet_missing",
            VortexError::InvalidImage { .. } => "invalid_image",
            VortexError::InvalidLicenseFormat => "invalid_license_format",
            VortexError::LicenseNotFound => "license_not_found",
            VortexError::MissingApiKey => "missing_api_key",
            VortexError::Upstream { .. } => "api_error",
            VortexError::NotFound { .. } => "not_found",
            VortexError::SerializationError(_)
            | VortexError::StorageError(_)
            | VortexError::InternalError(_) => "server_error",
        }
    }

    /// Boundary category
    pub fn category(&self) -> ErrorCategory {
        match self {
            VortexError::SecurityCheckFailed | VortexError::UnsafeUrl { .. } => {
                ErrorCategory::Security
            }
            VortexError::NotLoggedIn { .. } | VortexError::InvalidApiKey => ErrorCategory::Auth,
            VortexError::MissingField { .. }
            | VortexError::InvalidField { .. }
            | VortexError::InvalidAmount { .. }
            | VortexError::InvalidLicenseFormat
            | VortexError::InvalidSignatureEncoding { .. } => ErrorCategory::Input,
            VortexError::MissingApiKey | VortexError::Upstream { .. } => ErrorCategory::Upstream,
            VortexError::SerializationError(_)
            | VortexError::StorageError(_)
            | VortexError::InternalError(_) => ErrorCategory::Server,
            _ => ErrorCategory::Domain,
        }
    }

    /// Whether details must be hidden from clients outside debug mode
    pub fn is_server_error(&self) -> bool {
        self.category() == ErrorCategory::Server
    }

    /// Create a missing field error
    pub fn missing(field: impl Into<String>) -> Self {
        VortexError::MissingField {
            field: field.into(),
        }
    }

    /// Create an invalid field error
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        VortexError::InvalidField {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        VortexError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Create a not-logged-in error
    pub fn not_logged_in(action: impl Into<String>) -> Self {
        VortexError::NotLoggedIn {
            action: action.into(),
        }
    }
}

impl From<serde_json::Error> for VortexError {
    fn from(err: serde_json::Error) -> Self {
        VortexError::SerializationError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_follow_taxonomy() {
        assert_eq!(VortexError::SecurityCheckFailed.code(), "security_error");
        assert_eq!(VortexError::not_logged_in("save images").code(), "auth_error");
        assert_eq!(VortexError::missing("image").code(), "input_error");
        assert_eq!(
            VortexError::InvalidCurrency {
                currency: "USD".into()
            }
            .code(),
            "invalid_currency"
        );
        assert_eq!(VortexError::MissingApiKey.code(), "missing_api_key");
        assert_eq!(VortexError::InternalError("boom".into()).code(), "server_error");
    }

    #[test]
    fn test_categories() {
        assert_eq!(VortexError::SecurityCheckFailed.category(), ErrorCategory::Security);
        assert_eq!(VortexError::InvalidApiKey.category(), ErrorCategory::Auth);
        assert_eq!(VortexError::missing("title").category(), ErrorCategory::Input);
        assert_eq!(
            VortexError::InsufficientBalance {
                required: Decimal::new(139, 0),
                available: Decimal::new(100, 0),
            }
            .category(),
            ErrorCategory::Domain
        );
        assert_eq!(
            VortexError::Upstream {
                status: 500,
                message: "down".into()
            }
            .category(),
            ErrorCategory::Upstream
        );
        assert!(VortexError::StorageError("locked".into()).is_server_error());
        assert!(!VortexError::SelfTransfer.is_server_error());
    }

    #[test]
    fn test_message_carries_registry_code() {
        let err = VortexError::InsufficientBalance {
            required: Decimal::new(139, 0),
            available: Decimal::new(100, 0),
        };
        let msg = err.to_string();
        assert!(msg.starts_with("[VX-TX-002]"));
        assert!(msg.contains("139"));
    }
}
