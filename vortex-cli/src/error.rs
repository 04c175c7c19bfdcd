//! CLI Error Types
//!
//! Error types for the VORTEX CLI application and its API client.

use thiserror::Error;
use vortex_engine::EngineError;

/// Fallback when an error response carries no message
pub const UNKNOWN_API_ERROR: &str = "Unknown API error occurred.";

/// API client errors
#[derive(Error, Debug)]
pub enum ClientError {
    /// No API key configured; nothing was sent
    #[error("API key is required")]
    MissingApiKey,

    /// Request could not be built or delivered
    #[error("API connection error: {message}")]
    Connection { message: String },

    /// Server answered with status >= 400
    #[error("API request failed: {status} - {message}")]
    Api { status: u16, message: String },

    /// Response body was not JSON
    #[error("Invalid API response: {0}")]
    Decode(String),
}

impl ClientError {
    /// Stable snake_case code
    pub fn code(&self) -> &'static str {
        match self {
            ClientError::MissingApiKey => "missing_api_key",
            ClientError::Connection { .. } => "connection_error",
            ClientError::Api { .. } => "api_error",
            ClientError::Decode(_) => "api_error",
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ClientError::Decode(err.to_string())
        } else {
            ClientError::Connection {
                message: err.to_string(),
            }
        }
    }
}

/// Client result type
pub type ClientResult<T> = Result<T, ClientError>;

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// Invalid argument
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    /// API client error
    #[error(transparent)]
    Client(#[from] ClientError),

    /// Local engine error
    #[error("{0}")]
    Engine(#[from] EngineError),

    /// File I/O error
    #[error("File I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;

impl CliError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        CliError::ConfigError {
            message: message.into(),
        }
    }

    /// Create an invalid argument error
    pub fn invalid_arg(message: impl Into<String>) -> Self {
        CliError::InvalidArgument {
            message: message.into(),
        }
    }

    /// 0 ok, 1 general, 2 config/arg, 3 connection, 4 API
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::ConfigError { .. } | CliError::InvalidArgument { .. } => 2,
            CliError::Client(ClientError::MissingApiKey) => 2,
            CliError::Client(ClientError::Connection { .. }) => 3,
            CliError::Client(ClientError::Api { .. } | ClientError::Decode(_)) => 4,
            CliError::Engine(EngineError::Config(_)) => 2,
            CliError::Engine(_) | CliError::IoError(_) | CliError::JsonError(_) => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error() {
        let err = CliError::config("Missing API URL");
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("Missing API URL"));
    }

    #[test]
    fn test_client_exit_codes() {
        assert_eq!(CliError::from(ClientError::MissingApiKey).exit_code(), 2);
        let conn = ClientError::Connection {
            message: "refused".into(),
        };
        assert_eq!(CliError::from(conn).exit_code(), 3);
        let api = ClientError::Api {
            status: 401,
            message: "Invalid API key".into(),
        };
        assert!(api.to_string().contains("401"));
        assert_eq!(CliError::from(api).exit_code(), 4);
    }

    #[test]
    fn test_engine_exit_codes() {
        let err = CliError::from(EngineError::config("VORTEX_CACHE_DEFAULT_TTL: bad"));
        assert_eq!(err.exit_code(), 2);
        let err = CliError::from(EngineError::from(vortex_core::VortexError::missing("user_id")));
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_client_error_codes() {
        assert_eq!(ClientError::MissingApiKey.code(), "missing_api_key");
        assert_eq!(
            ClientError::Api {
                status: 500,
                message: UNKNOWN_API_ERROR.into()
            }
            .code(),
            "api_error"
        );
    }
}
