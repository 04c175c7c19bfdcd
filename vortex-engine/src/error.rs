//! VORTEX Engine Error Types

use thiserror::Error;
use vortex_core::VortexError;
use vortex_store::StoreError;

/// Engine Result type
pub type EngineResult<T> = Result<T, EngineError>;

/// Engine Error
#[derive(Debug, Error)]
pub enum EngineError {
    /// Domain error with a stable client code
    #[error(transparent)]
    Domain(#[from] VortexError),

    /// Invalid or missing configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Logging subscriber could not be installed
    #[error("Logging initialization failed: {0}")]
    Logging(String),
}

impl EngineError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Stable snake_case code returned to AJAX clients
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::Domain(e) => e.code(),
            EngineError::Config(_) | EngineError::Logging(_) => "server_error",
        }
    }

    /// Whether the failure is ours rather than the caller's
    pub fn is_server_error(&self) -> bool {
        match self {
            EngineError::Domain(e) => e.is_server_error(),
            EngineError::Config(_) | EngineError::Logging(_) => true,
        }
    }

    /// Borrow the domain error, if this is one
    pub fn as_domain(&self) -> Option<&VortexError> {
        match self {
            EngineError::Domain(e) => Some(e),
            _ => None,
        }
    }
}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        Self::Domain(err.into())
    }
}
