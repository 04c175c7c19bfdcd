//! SaaS Backend Handlers
//!
//! `POST /ai/compute`, `POST /analytics`, `GET /health` and the market
//! prediction reads. Every call needs an API key (body `api_key` or the
//! `X-API-Key` header) and every successful call is written to the
//! `vortex_api_usage` log target.

use axum::{
    body::Bytes,
    extract::{ConnectInfo, Path, Query, State},
    http::HeaderMap,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;
use vortex_core::{query_key, Period, QueryType, UserId};

use crate::auth::{api_key_from, client_ip};
use crate::error::{ApiError, ApiResult};
use crate::handlers::ops::health_report;
use crate::insights::{AnalyticsOperation, ComputeOperation, DateRange, TrendMetric, TrendPeriod};
use crate::state::AppState;

/// `{success: true, data}`
fn success(data: Value) -> Json<Value> {
    Json(json!({ "success": true, "data": data }))
}

fn parse_json(body: &[u8]) -> ApiResult<Value> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(json!({}));
    }
    match serde_json::from_slice::<Value>(body) {
        Ok(value @ Value::Object(_)) => Ok(value),
        _ => Err(ApiError::bad_request("Invalid JSON body")),
    }
}

/// Key fingerprint for logs; the key itself is never written
fn key_fingerprint(key: &str) -> String {
    let visible: String = key.chars().take(4).collect();
    format!("{visible}***")
}

/// One line per served operation, without the key
fn log_usage(operation: &str, api_key: &str, ip: &str, input: &Value) {
    let mut params = input.clone();
    if let Value::Object(map) = &mut params {
        map.remove("api_key");
    }
    info!(
        target: "vortex_api_usage",
        operation,
        api_key = %key_fingerprint(api_key),
        request_id = %uuid::Uuid::new_v4(),
        client_ip = ip,
        request_params = %params,
        "api usage"
    );
}

/// Parsed body plus the authorized key
struct SaasRequest {
    input: Value,
    api_key: String,
    ip: String,
}

fn authorize(
    state: &AppState,
    headers: &HeaderMap,
    peer: Option<SocketAddr>,
    body: &[u8],
) -> ApiResult<SaasRequest> {
    // An unparseable body still has to fail auth first when no header key is sent
    let input = parse_json(body);
    let api_key = api_key_from(headers, input.as_ref().ok());
    state.auth_config.authorize(api_key.as_deref())?;
    Ok(SaasRequest {
        input: input?,
        api_key: api_key.unwrap_or_default(),
        ip: client_ip(headers, peer),
    })
}

fn str_field<'a>(input: &'a Value, field: &str) -> Option<&'a str> {
    input
        .get(field)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn date_range(input: &Value) -> ApiResult<DateRange> {
    let today = chrono::Utc::now().date_naive();
    Ok(DateRange::resolve(
        str_field(input, "start_date"),
        str_field(input, "end_date"),
        today,
    )?)
}

/// Operation payload: the named field, `data`, or the body itself
fn payload<'a>(input: &'a Value, field: &str) -> &'a Value {
    input
        .get(field)
        .or_else(|| input.get("data"))
        .filter(|v| v.is_object())
        .unwrap_or(input)
}

// ============================================================
// POST /ai/compute
// ============================================================

pub async fn compute(
    State(state): State<Arc<AppState>>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    let request = authorize(&state, &headers, connect_info.map(|ci| ci.0), &body)?;
    let input = &request.input;
    let operation = str_field(input, "operation")
        .and_then(ComputeOperation::parse)
        .ok_or(ApiError::InvalidOperation)?;

    let insights = &state.insights;
    let data = match operation {
        ComputeOperation::AnalyzeArtwork => {
            insights.analyze_artwork(payload(input, "artwork_data"))
        }
        ComputeOperation::PredictMarketTrends => {
            insights.predict_market_trends(payload(input, "params"))
        }
        ComputeOperation::GetBusinessStrategy => {
            insights.business_strategy(payload(input, "business_data"))
        }
    };

    log_usage(operation.as_str(), &request.api_key, &request.ip, input);
    Ok(success(data))
}

// ============================================================
// POST /analytics
// ============================================================

pub async fn analytics(
    State(state): State<Arc<AppState>>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    let request = authorize(&state, &headers, connect_info.map(|ci| ci.0), &body)?;
    let input = &request.input;
    let operation = str_field(input, "operation")
        .and_then(AnalyticsOperation::parse)
        .ok_or(ApiError::InvalidOperation)?;

    let insights = &state.insights;
    let data = match operation {
        AnalyticsOperation::MarketOverview => insights.market_overview(&date_range(input)?),
        AnalyticsOperation::ArtistPerformance => {
            let artist_id = input
                .get("artist_id")
                .filter(|v| !v.is_null())
                .ok_or_else(|| ApiError::bad_request("Missing artist_id parameter"))?;
            insights.artist_performance(artist_id, &date_range(input)?)
        }
        AnalyticsOperation::SalesMetrics => {
            let group_by = str_field(input, "group_by").unwrap_or("day");
            let filters = input.get("filters").cloned().unwrap_or_else(|| json!({}));
            insights.sales_metrics(&date_range(input)?, group_by, &filters)
        }
        AnalyticsOperation::TrendAnalysis => {
            let metric = match str_field(input, "metric") {
                Some(raw) => TrendMetric::parse(raw)
                    .ok_or_else(|| ApiError::bad_request(format!("Invalid metric: {raw}")))?,
                None => TrendMetric::default(),
            };
            let period = match str_field(input, "period") {
                Some(raw) => TrendPeriod::parse(raw)
                    .ok_or_else(|| ApiError::bad_request(format!("Invalid period: {raw}")))?,
                None => TrendPeriod::default(),
            };
            let segment = str_field(input, "segment").map(str::to_string);
            let analysis = insights.trend_analysis(metric, period, segment);
            serde_json::to_value(analysis).map_err(|e| ApiError::internal(e.to_string()))?
        }
    };

    log_usage(operation.as_str(), &request.api_key, &request.ip, input);
    Ok(success(data))
}

// ============================================================
// GET /health
// ============================================================

/// Keyed health check; the body carries engine component health
pub async fn health(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> ApiResult<impl IntoResponse> {
    state
        .auth_config
        .authorize(api_key_from(&headers, None).as_deref())?;
    let (status, report) = health_report(&state).await;
    let data = serde_json::to_value(report).map_err(|e| ApiError::internal(e.to_string()))?;
    Ok((status, success(data)))
}

// ============================================================
// Market predictions
// ============================================================

#[derive(Debug, Deserialize)]
pub struct PredictionQuery {
    pub category: Option<String>,
    pub api_key: Option<String>,
}

fn authorize_query(
    state: &AppState,
    headers: &HeaderMap,
    from_query: Option<&str>,
) -> ApiResult<String> {
    let key = api_key_from(headers, None).or_else(|| {
        from_query
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string)
    });
    state.auth_config.authorize(key.as_deref())?;
    Ok(key.unwrap_or_default())
}

/// `GET /market-predictions?category=`
pub async fn market_predictions(
    State(state): State<Arc<AppState>>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    Query(query): Query<PredictionQuery>,
) -> ApiResult<Json<Value>> {
    let api_key = authorize_query(&state, &headers, query.api_key.as_deref())?;
    let category = query.category.as_deref().map(str::trim).filter(|c| !c.is_empty());
    let data = state.insights.market_predictions(category);

    let ip = client_ip(&headers, connect_info.map(|ci| ci.0));
    log_usage("market_predictions", &api_key, &ip, &json!({ "category": category }));
    Ok(success(data))
}

/// `GET /market-predictions/asset/:id`
pub async fn asset_prediction(
    State(state): State<Arc<AppState>>,
    Path(asset_id): Path<String>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    Query(query): Query<PredictionQuery>,
) -> ApiResult<Json<Value>> {
    let api_key = authorize_query(&state, &headers, query.api_key.as_deref())?;
    let data = state.insights.asset_prediction(asset_id.trim());

    let ip = client_ip(&headers, connect_info.map(|ci| ci.0));
    log_usage("asset_prediction", &api_key, &ip, &json!({ "asset_id": asset_id }));
    Ok(success(data))
}

// ============================================================
// Thorius analytics reads
// ============================================================

#[derive(Debug, Deserialize)]
pub struct PeriodQuery {
    pub period: Option<String>,
    pub api_key: Option<String>,
}

/// `GET /api/v1/thorius/trends?period=`
pub async fn thorius_trends(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<PeriodQuery>,
) -> ApiResult<Json<Value>> {
    authorize_query(&state, &headers, query.api_key.as_deref())?;
    let period = Period::parse_lenient(query.period.as_deref().unwrap_or_default());
    let key = query_key(&json!({ "report": "market_trends", "period": period.as_str() }));

    let engine = &state.engine;
    let trends = engine
        .cache
        .remember(&key, None, QueryType::Analytics, || {
            engine.analytics.get_market_trends(period)
        })
        .await?;
    let data = serde_json::to_value(trends).map_err(|e| ApiError::internal(e.to_string()))?;
    Ok(success(data))
}

/// `GET /api/v1/thorius/users/:id/behavior?period=`
pub async fn thorius_user_behavior(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<u64>,
    headers: HeaderMap,
    Query(query): Query<PeriodQuery>,
) -> ApiResult<Json<Value>> {
    authorize_query(&state, &headers, query.api_key.as_deref())?;
    let user = UserId(user_id);
    let period = Period::parse_lenient(query.period.as_deref().unwrap_or_default());
    let key = query_key(&json!({
        "report": "user_behavior",
        "user_id": user_id,
        "period": period.as_str(),
    }));

    let engine = &state.engine;
    let behavior = engine
        .cache
        .remember(&key, None, QueryType::Analytics, || {
            engine.analytics.get_user_behavior(user, period)
        })
        .await?;
    let data = serde_json::to_value(behavior).map_err(|e| ApiError::internal(e.to_string()))?;
    Ok(success(data))
}
