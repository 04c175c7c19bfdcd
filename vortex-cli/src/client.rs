//! API Client
//!
//! HTTP client for the VORTEX SaaS backend. Every request carries the
//! `X-API-Key` header; a client without a key fails before sending.

use crate::error::{ClientError, ClientResult, UNKNOWN_API_ERROR};
use chrono::{Duration as DateDuration, NaiveDate, Utc};
use reqwest::{Client, Method};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;
use vortex_api::API_KEY_HEADER;

/// Default SaaS endpoint
pub const DEFAULT_BASE_URL: &str = "https://www.vortexartec.com/api/v1";

/// Days covered by analytics requests without explicit dates
pub const DEFAULT_RANGE_DAYS: i64 = 30;

/// Client configuration
#[derive(Debug, Clone)]
pub struct ApiClientConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl Default for ApiClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            timeout: Duration::from_secs(30),
        }
    }
}

impl ApiClientConfig {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key,
            ..Self::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// VORTEX SaaS API client
pub struct VortexApiClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl VortexApiClient {
    /// Create a new client
    pub fn new(config: ApiClientConfig) -> ClientResult<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        let api_key = config
            .api_key
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'))
    }

    /// Send a request. GET and DELETE carry `data` as a query string; other
    /// methods send it as a JSON body.
    pub async fn request(
        &self,
        method: Method,
        endpoint: &str,
        data: Option<&Value>,
    ) -> ClientResult<Value> {
        let api_key = self.api_key.as_deref().ok_or(ClientError::MissingApiKey)?;
        let url = self.url(endpoint);
        debug!(%method, %url, "VORTEX API request");

        let mut builder = self
            .client
            .request(method.clone(), &url)
            .header(API_KEY_HEADER, api_key)
            .header(reqwest::header::CONTENT_TYPE, "application/json");

        if let Some(data) = data {
            builder = if method == Method::GET || method == Method::DELETE {
                builder.query(&query_pairs(data))
            } else {
                builder.json(data)
            };
        }

        let response = builder.send().await?;
        let status = response.status();
        let text = response.text().await?;
        let body: Option<Value> = serde_json::from_str(&text).ok();

        if status.as_u16() >= 400 {
            return Err(ClientError::Api {
                status: status.as_u16(),
                message: error_message(body.as_ref()),
            });
        }

        body.ok_or_else(|| ClientError::Decode(format!("expected JSON from {url}")))
    }

    pub async fn get(&self, endpoint: &str, params: Option<&Value>) -> ClientResult<Value> {
        self.request(Method::GET, endpoint, params).await
    }

    pub async fn post(&self, endpoint: &str, data: &Value) -> ClientResult<Value> {
        self.request(Method::POST, endpoint, Some(data)).await
    }

    pub async fn put(&self, endpoint: &str, data: &Value) -> ClientResult<Value> {
        self.request(Method::PUT, endpoint, Some(data)).await
    }

    pub async fn delete(&self, endpoint: &str, params: Option<&Value>) -> ClientResult<Value> {
        self.request(Method::DELETE, endpoint, params).await
    }

    // ============================================================
    // Marketplace insights
    // ============================================================

    /// Category predictions; `params` may carry `category`
    pub async fn market_predictions(&self, params: Option<&Value>) -> ClientResult<Value> {
        self.get("market-predictions", params).await
    }

    pub async fn asset_prediction(&self, asset_id: &str) -> ClientResult<Value> {
        self.get(&format!("market-predictions/asset/{asset_id}"), None)
            .await
    }

    pub async fn market_overview(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> ClientResult<Value> {
        let (start, end) = resolve_range(start, end);
        self.post(
            "analytics",
            &json!({
                "operation": "market_overview",
                "start_date": start.to_string(),
                "end_date": end.to_string(),
            }),
        )
        .await
    }

    pub async fn artist_performance(
        &self,
        artist_id: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> ClientResult<Value> {
        let (start, end) = resolve_range(start, end);
        self.post(
            "analytics",
            &json!({
                "operation": "artist_performance",
                "artist_id": artist_id,
                "start_date": start.to_string(),
                "end_date": end.to_string(),
            }),
        )
        .await
    }

    pub async fn sales_metrics(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        group_by: &str,
    ) -> ClientResult<Value> {
        let (start, end) = resolve_range(start, end);
        self.post(
            "analytics",
            &json!({
                "operation": "sales_metrics",
                "start_date": start.to_string(),
                "end_date": end.to_string(),
                "group_by": group_by,
            }),
        )
        .await
    }

    pub async fn analyze_artwork(&self, artwork_data: &Value) -> ClientResult<Value> {
        self.post(
            "ai/compute",
            &json!({ "operation": "analyze_artwork", "artwork_data": artwork_data }),
        )
        .await
    }

    pub async fn business_strategy(&self, business_data: &Value) -> ClientResult<Value> {
        self.post(
            "ai/compute",
            &json!({ "operation": "get_business_strategy", "business_data": business_data }),
        )
        .await
    }

    /// Keyed health check
    pub async fn health(&self) -> ClientResult<Value> {
        self.get("health", None).await
    }
}

/// `message`, else `error`, else a fixed fallback
fn error_message(body: Option<&Value>) -> String {
    body.and_then(|b| {
        ["message", "error"]
            .iter()
            .find_map(|field| b.get(*field).and_then(Value::as_str))
    })
    .map(str::to_string)
    .unwrap_or_else(|| UNKNOWN_API_ERROR.to_string())
}

/// Flatten a JSON object into query pairs; nested values are sent as JSON
fn query_pairs(data: &Value) -> Vec<(String, String)> {
    let Some(map) = data.as_object() else {
        return Vec::new();
    };
    map.iter()
        .filter(|(_, v)| !v.is_null())
        .map(|(k, v)| {
            let value = match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (k.clone(), value)
        })
        .collect()
}

/// Missing bounds fall back to the last thirty days ending today
fn resolve_range(start: Option<NaiveDate>, end: Option<NaiveDate>) -> (NaiveDate, NaiveDate) {
    let end = end.unwrap_or_else(|| Utc::now().date_naive());
    let start = start.unwrap_or(end - DateDuration::days(DEFAULT_RANGE_DAYS));
    (start, end)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_fallbacks() {
        assert_eq!(
            error_message(Some(&json!({"message": "Missing artist_id parameter"}))),
            "Missing artist_id parameter"
        );
        assert_eq!(error_message(Some(&json!({"error": "boom"}))), "boom");
        assert_eq!(error_message(Some(&json!({"success": false}))), UNKNOWN_API_ERROR);
        assert_eq!(error_message(None), UNKNOWN_API_ERROR);
    }

    #[test]
    fn test_query_pairs() {
        let pairs = query_pairs(&json!({"category": "digital", "limit": 5, "skip": null}));
        assert_eq!(pairs.len(), 2);
        assert!(pairs.contains(&("category".to_string(), "digital".to_string())));
        assert!(pairs.contains(&("limit".to_string(), "5".to_string())));
        assert!(query_pairs(&json!([1, 2])).is_empty());
    }

    #[test]
    fn test_resolve_range_defaults() {
        let end = NaiveDate::from_ymd_opt(2024, 3, 31).unwrap();
        let (start, resolved_end) = resolve_range(None, Some(end));
        assert_eq!(resolved_end, end);
        assert_eq!(start, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
    }

    #[test]
    fn test_url_joining() {
        let client = VortexApiClient::new(ApiClientConfig::new(
            "http://localhost:3000/api/v1/",
            Some("key".into()),
        ))
        .unwrap();
        assert_eq!(client.url("/health"), "http://localhost:3000/api/v1/health");
        assert_eq!(client.url("ai/compute"), "http://localhost:3000/api/v1/ai/compute");
    }

    #[tokio::test]
    async fn test_missing_key_fails_before_sending() {
        let client =
            VortexApiClient::new(ApiClientConfig::new("http://127.0.0.1:9", Some("  ".into())))
                .unwrap();
        let err = client.health().await.unwrap_err();
        assert!(matches!(err, ClientError::MissingApiKey));
    }
}
