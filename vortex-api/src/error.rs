//! API Error Types
//!
//! Two response shapes leave this crate:
//!
//! - AJAX actions always answer HTTP 200 with `{success:false, data:{code, message}}`
//! - SaaS endpoints answer with a 4xx/5xx status and `{error: message}`

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use vortex_core::{ErrorCategory, VortexError};
use vortex_engine::EngineError;

use crate::metrics::record_error;

/// Shown instead of server error details outside debug mode
pub const GENERIC_ERROR_MESSAGE: &str = "An unexpected error occurred. Please try again later.";

/// API-specific errors
#[derive(Error, Debug)]
pub enum ApiError {
    /// Error raised by a marketplace service
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// No API key in body or header
    #[error("API key is required")]
    MissingApiKey,

    /// API key not in the configured set
    #[error("Invalid API key")]
    InvalidApiKey,

    /// Unknown `operation` or AJAX action
    #[error("Invalid operation")]
    InvalidOperation,

    /// Malformed request
    #[error("{message}")]
    BadRequest { message: String },

    /// Internal error
    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// API result type
pub type ApiResult<T> = Result<T, ApiError>;

/// SaaS error body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl From<VortexError> for ApiError {
    fn from(err: VortexError) -> Self {
        ApiError::Engine(err.into())
    }
}

impl ApiError {
    /// HTTP status used by the SaaS endpoints
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Engine(e) => match e.as_domain() {
                Some(VortexError::NotFound { .. }) => StatusCode::NOT_FOUND,
                Some(domain) => match domain.category() {
                    ErrorCategory::Security => StatusCode::FORBIDDEN,
                    ErrorCategory::Auth => StatusCode::UNAUTHORIZED,
                    ErrorCategory::Input => StatusCode::BAD_REQUEST,
                    ErrorCategory::Domain => StatusCode::UNPROCESSABLE_ENTITY,
                    ErrorCategory::Upstream => StatusCode::BAD_GATEWAY,
                    ErrorCategory::Server => StatusCode::INTERNAL_SERVER_ERROR,
                },
                None => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::MissingApiKey | ApiError::InvalidApiKey => StatusCode::UNAUTHORIZED,
            ApiError::InvalidOperation | ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable snake_case code
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::Engine(e) => e.code(),
            ApiError::MissingApiKey => "missing_api_key",
            ApiError::InvalidApiKey => "invalid_api_key",
            ApiError::InvalidOperation => "invalid_operation",
            ApiError::BadRequest { .. } => "input_error",
            ApiError::Internal { .. } => "server_error",
        }
    }

    pub fn is_server_error(&self) -> bool {
        match self {
            ApiError::Engine(e) => e.is_server_error(),
            ApiError::Internal { .. } => true,
            _ => false,
        }
    }

    /// Message safe to hand to the client
    pub fn public_message(&self, debug: bool) -> String {
        if self.is_server_error() && !debug {
            GENERIC_ERROR_MESSAGE.to_string()
        } else {
            self.to_string()
        }
    }

    /// Create a bad request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::Internal {
            message: message.into(),
        }
    }

    /// Log and count the error once, at the boundary
    pub(crate) fn observe(&self) {
        record_error(self.error_code());
        if self.is_server_error() {
            tracing::error!(code = self.error_code(), error = %self, "request failed");
        } else {
            tracing::debug!(code = self.error_code(), error = %self, "request rejected");
        }
    }

    /// AJAX envelope for this error
    pub fn into_ajax(self, debug: bool) -> AjaxResponse {
        self.observe();
        AjaxResponse {
            success: false,
            data: serde_json::json!({
                "code": self.error_code(),
                "message": self.public_message(debug),
            }),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.observe();
        let status = self.status_code();
        let body = ErrorResponse {
            error: self.public_message(false),
        };
        (status, Json(body)).into_response()
    }
}

/// `{success, data}` envelope, always served with HTTP 200
#[derive(Debug, Serialize)]
pub struct AjaxResponse {
    pub success: bool,
    pub data: serde_json::Value,
}

impl AjaxResponse {
    pub fn ok(data: serde_json::Value) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

impl IntoResponse for AjaxResponse {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_key_errors() {
        assert_eq!(ApiError::MissingApiKey.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::MissingApiKey.to_string(), "API key is required");
        assert_eq!(ApiError::InvalidApiKey.to_string(), "Invalid API key");
        assert_eq!(ApiError::InvalidOperation.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_domain_error_status() {
        let err: ApiError = VortexError::InsufficientBalance {
            required: 10.into(),
            available: 1.into(),
        }
        .into();
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.error_code(), "insufficient_balance");

        let err: ApiError = VortexError::SecurityCheckFailed.into();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(err.error_code(), "security_error");

        let err: ApiError = VortexError::not_found("Transaction", "9").into();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_server_errors_are_masked() {
        let err: ApiError = VortexError::StorageError("disk I/O error at page 7".into()).into();
        assert_eq!(err.public_message(false), GENERIC_ERROR_MESSAGE);
        assert!(err.public_message(true).contains("disk I/O"));

        let err: ApiError = VortexError::missing("amount").into();
        assert!(err.public_message(false).contains("amount"));
    }

    #[test]
    fn test_ajax_envelope() {
        let envelope = ApiError::from(VortexError::SecurityCheckFailed).into_ajax(false);
        assert!(!envelope.success);
        assert_eq!(envelope.data["code"], "security_error");
        assert!(envelope.data["message"]
            .as_str()
            .unwrap()
            .contains("Security check failed"));
    }
}
