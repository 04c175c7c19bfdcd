//! Authentication and Request Identity
//!
//! # SaaS endpoints
//!
//! The API key is read from the JSON body field `api_key` first, then from
//! the header:
//! ```text
//! X-API-Key: your-api-key-here
//! ```
//! Valid keys come from `VORTEX_API_KEYS` (comma separated).
//!
//! # AJAX actions
//!
//! The logged-in user is supplied by the fronting site together with a user
//! token it fetched from `GET /api/v1/nonce` using its API key:
//! ```text
//! X-Vortex-User: 42
//! X-Vortex-User-Token: <64 hex characters>
//! ```
//! A missing, zero or malformed header, or a user without a valid token,
//! means an anonymous visitor.

use axum::http::{header, HeaderMap};
use std::net::SocketAddr;
use vortex_core::{SessionId, UserId};

use crate::error::{ApiError, ApiResult};
use crate::nonce::{constant_time_eq, NonceIssuer};

/// Header carrying the SaaS API key
pub const API_KEY_HEADER: &str = "x-api-key";

/// Header carrying the logged-in user id
pub const USER_HEADER: &str = "x-vortex-user";

/// Header carrying the token that authenticates [`USER_HEADER`]
pub const USER_TOKEN_HEADER: &str = "x-vortex-user-token";

/// Authentication configuration
#[derive(Debug, Clone, Default)]
pub struct AuthConfig {
    /// Accepted API keys
    pub api_keys: Vec<String>,
}

impl AuthConfig {
    /// Create from environment variables
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let api_keys = lookup("VORTEX_API_KEYS")
            .or_else(|| lookup("VORTEX_API_KEY"))
            .map(|v| {
                v.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default();
        Self { api_keys }
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_keys.push(key.into());
        self
    }

    /// Validate an API key
    pub fn validate_api_key(&self, key: &str) -> bool {
        self.api_keys
            .iter()
            .any(|k| constant_time_eq(k.as_bytes(), key.as_bytes()))
    }

    /// Position of an accepted key; used to name it without revealing it
    pub fn key_index(&self, key: &str) -> Option<usize> {
        self.api_keys
            .iter()
            .position(|k| constant_time_eq(k.as_bytes(), key.as_bytes()))
    }

    /// Missing key and unknown key are distinct failures
    pub fn authorize(&self, key: Option<&str>) -> ApiResult<()> {
        match key {
            None => Err(ApiError::MissingApiKey),
            Some(key) if self.validate_api_key(key) => Ok(()),
            Some(_) => Err(ApiError::InvalidApiKey),
        }
    }
}

/// API key from the body, falling back to the header
pub fn api_key_from(headers: &HeaderMap, body: Option<&serde_json::Value>) -> Option<String> {
    body.and_then(|b| b.get("api_key"))
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .or_else(|| {
            headers
                .get(API_KEY_HEADER)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(str::to_string)
        })
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Logged-in user, or [`UserId::ANONYMOUS`] when the user header is absent
/// or not backed by a valid user token
pub fn current_user(headers: &HeaderMap, nonces: &NonceIssuer) -> UserId {
    let Some(user) = header_str(headers, USER_HEADER)
        .and_then(|v| v.parse::<u64>().ok())
        .map(UserId)
    else {
        return UserId::ANONYMOUS;
    };
    if user.is_anonymous() {
        return user;
    }
    match header_str(headers, USER_TOKEN_HEADER) {
        Some(token) if nonces.verify_user_token(user, token) => user,
        _ => {
            tracing::debug!(%user, "user header without a valid token");
            UserId::ANONYMOUS
        }
    }
}

/// First `X-Forwarded-For` hop, else the peer address
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
        .unwrap_or_default()
}

pub fn user_agent(headers: &HeaderMap) -> String {
    headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

/// Analytics session from the `vortex_thorius_session` cookie
pub fn session_from_cookie(headers: &HeaderMap) -> Option<SessionId> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SessionId::COOKIE_NAME)
        .map(|(_, value)| value.trim())
        .filter(|value| !value.is_empty())
        .map(SessionId::new)
}

/// `Set-Cookie` value for a fresh analytics session
pub fn session_cookie(session: &SessionId) -> String {
    format!(
        "{}={}; Max-Age={}; Path=/; HttpOnly; SameSite=Lax",
        SessionId::COOKIE_NAME,
        session.as_str(),
        SessionId::COOKIE_MAX_AGE_SECS
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use serde_json::json;

    #[test]
    fn test_auth_config_from_vars() {
        let config = AuthConfig::from_vars(|key| match key {
            "VORTEX_API_KEYS" => Some("alpha, beta,,".to_string()),
            _ => None,
        });
        assert_eq!(config.api_keys, vec!["alpha", "beta"]);
        assert!(config.validate_api_key("beta"));
        assert!(!config.validate_api_key("gamma"));
    }

    #[test]
    fn test_authorize() {
        let config = AuthConfig::default().with_api_key("alpha");
        assert!(config.authorize(Some("alpha")).is_ok());
        assert!(matches!(config.authorize(None), Err(ApiError::MissingApiKey)));
        assert!(matches!(config.authorize(Some("nope")), Err(ApiError::InvalidApiKey)));
    }

    #[test]
    fn test_api_key_body_wins_over_header() {
        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, HeaderValue::from_static("from-header"));

        let body = json!({"api_key": "from-body"});
        assert_eq!(api_key_from(&headers, Some(&body)).as_deref(), Some("from-body"));
        assert_eq!(api_key_from(&headers, Some(&json!({}))).as_deref(), Some("from-header"));
        assert_eq!(api_key_from(&HeaderMap::new(), None), None);
    }

    #[test]
    fn test_current_user_requires_token() {
        let nonces = NonceIssuer::new("auth-secret");
        let mut headers = HeaderMap::new();
        assert!(current_user(&headers, &nonces).is_anonymous());

        headers.insert(USER_HEADER, HeaderValue::from_static("42"));
        assert!(current_user(&headers, &nonces).is_anonymous());

        let token = nonces.user_token(UserId(42));
        headers.insert(USER_TOKEN_HEADER, HeaderValue::from_str(&token).unwrap());
        assert_eq!(current_user(&headers, &nonces), UserId(42));

        // A token for one user does not vouch for another
        headers.insert(USER_HEADER, HeaderValue::from_static("1"));
        assert!(current_user(&headers, &nonces).is_anonymous());

        headers.insert(USER_HEADER, HeaderValue::from_static("admin"));
        assert!(current_user(&headers, &nonces).is_anonymous());
    }

    #[test]
    fn test_key_index() {
        let config = AuthConfig::default().with_api_key("alpha").with_api_key("beta");
        assert_eq!(config.key_index("beta"), Some(1));
        assert_eq!(config.key_index("gamma"), None);
    }

    #[test]
    fn test_client_ip_prefers_forwarded_for() {
        let peer: SocketAddr = "10.0.0.9:5000".parse().unwrap();
        let mut headers = HeaderMap::new();
        assert_eq!(client_ip(&headers, Some(peer)), "10.0.0.9");
        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.7, 10.0.0.1"));
        assert_eq!(client_ip(&headers, Some(peer)), "203.0.113.7");
        assert_eq!(client_ip(&HeaderMap::new(), None), "");
    }

    #[test]
    fn test_session_cookie_roundtrip() {
        let session = SessionId::new("abc-123");
        let set_cookie = session_cookie(&session);
        assert!(set_cookie.starts_with("vortex_thorius_session=abc-123;"));
        assert!(set_cookie.contains("Max-Age=2592000"));

        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; vortex_thorius_session=abc-123"),
        );
        assert_eq!(session_from_cookie(&headers), Some(session));
    }
}
