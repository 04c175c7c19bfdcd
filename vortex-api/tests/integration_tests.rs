//! Integration tests for VORTEX API endpoints
//!
//! These run the full router over an in-memory engine: AJAX actions with real
//! nonces, the SaaS backend with API keys, and ops endpoints.

use axum::http::{HeaderName, HeaderValue};
use axum_test::TestServer;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use std::str::FromStr;
use std::sync::Arc;
use vortex_api::{build_app, ApiConfig, AppState, AuthConfig, NonceIssuer};
use vortex_core::UserId;
use vortex_engine::{EngineConfig, VortexEngine};

const API_KEY: &str = "test-api-key";
const NONCE_SECRET: &str = "integration-secret";
const WALLET: &str = "0x52908400098527886E0F7030069857D2E4169EE7";

struct TestApp {
    server: TestServer,
    engine: Arc<VortexEngine>,
    nonces: NonceIssuer,
}

/// Create test server
async fn create_test_app() -> TestApp {
    let engine = Arc::new(VortexEngine::in_memory(EngineConfig::default()).await.unwrap());
    let config = ApiConfig {
        nonce_secret: Some(NONCE_SECRET.to_string()),
        metrics_enabled: false,
        rate_limit_per_minute: 0,
        ..ApiConfig::default()
    };
    let state = AppState::with_config(config, engine.clone())
        .with_auth(AuthConfig::default().with_api_key(API_KEY));
    TestApp {
        server: TestServer::new(build_app(state)).unwrap(),
        engine,
        nonces: NonceIssuer::new(NONCE_SECRET),
    }
}

fn user_header(user: u64) -> (HeaderName, HeaderValue) {
    (
        HeaderName::from_static("x-vortex-user"),
        HeaderValue::from_str(&user.to_string()).unwrap(),
    )
}

fn key_header() -> (HeaderName, HeaderValue) {
    (
        HeaderName::from_static("x-api-key"),
        HeaderValue::from_static(API_KEY),
    )
}

impl TestApp {
    /// `X-Vortex-User-Token` vouching for `user`
    fn token_header(&self, user: u64) -> (HeaderName, HeaderValue) {
        (
            HeaderName::from_static("x-vortex-user-token"),
            HeaderValue::from_str(&self.nonces.user_token(UserId(user))).unwrap(),
        )
    }

    /// POST an AJAX action with a valid nonce and user token for `user`
    async fn ajax(&self, action: &str, user: u64, mut body: Value) -> Value {
        body["nonce"] = json!(self.nonces.create(action, UserId(user)));
        let (name, value) = user_header(user);
        let (token_name, token_value) = self.token_header(user);
        let response = self
            .server
            .post("/wp-admin/admin-ajax.php")
            .add_query_param("action", action)
            .add_header(name, value)
            .add_header(token_name, token_value)
            .json(&body)
            .await;
        response.assert_status_ok();
        response.json()
    }

    async fn balance(&self, user: u64) -> Decimal {
        let body = self.ajax("vortex_get_tola_balance", user, json!({})).await;
        assert_eq!(body["success"], true, "{body}");
        Decimal::from_str(body["data"]["balance"].as_str().unwrap()).unwrap()
    }
}

// ============ Ops Endpoint Tests ============

#[tokio::test]
async fn test_healthz() {
    let app = create_test_app().await;

    let response = app.server.get("/healthz").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_ne!(body["status"], "unhealthy");
    assert_eq!(body["components"][0]["name"], "database");
    assert_eq!(body["components"][0]["status"], "healthy");
}

#[tokio::test]
async fn test_issue_nonce_matches_issuer() {
    let app = create_test_app().await;
    let (name, value) = key_header();

    let response = app
        .server
        .get("/api/v1/nonce")
        .add_query_param("action", "vortex_connect_wallet")
        .add_query_param("user_id", "7")
        .add_header(name, value)
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    let nonce = body["nonce"].as_str().unwrap();
    assert!(app.nonces.verify("vortex_connect_wallet", UserId(7), nonce));
    assert!(!app.nonces.verify("vortex_connect_wallet", UserId(8), nonce));
    let token = body["user_token"].as_str().unwrap();
    assert!(app.nonces.verify_user_token(UserId(7), token));
}

#[tokio::test]
async fn test_issue_nonce_requires_api_key() {
    let app = create_test_app().await;

    let response = app
        .server
        .get("/api/v1/nonce")
        .add_query_param("action", "vortex_process_transaction")
        .add_query_param("user_id", "1")
        .await;

    response.assert_status_unauthorized();
    assert_eq!(response.json::<Value>()["error"], "API key is required");
}

#[tokio::test]
async fn test_anonymous_nonce_has_no_user_token() {
    let app = create_test_app().await;
    let (name, value) = key_header();

    let response = app
        .server
        .get("/api/v1/nonce")
        .add_query_param("action", "vortex_thorius_track_analytics")
        .add_header(name, value)
        .await;

    response.assert_status_ok();
    assert!(response.json::<Value>().get("user_token").is_none());
}

#[tokio::test]
async fn test_issue_nonce_unknown_action() {
    let app = create_test_app().await;
    let (name, value) = key_header();

    let response = app
        .server
        .get("/api/v1/nonce")
        .add_query_param("action", "vortex_drop_tables")
        .add_header(name, value)
        .await;

    response.assert_status_bad_request();
}

#[tokio::test]
async fn test_spoofed_user_header_cannot_spend() {
    let app = create_test_app().await;
    app.engine
        .transactions
        .award_points(UserId(1), Decimal::new(1000, 0), "victim funds")
        .await
        .unwrap();

    // No API key: the nonce endpoint refuses
    let refused = app
        .server
        .get("/api/v1/nonce")
        .add_query_param("action", "vortex_process_transaction")
        .add_query_param("user_id", "1")
        .await;
    refused.assert_status_unauthorized();

    // Even with a valid nonce, the user header alone is not trusted
    let nonce = app.nonces.create("vortex_process_transaction", UserId(1));
    let (name, value) = user_header(1);
    let body = app
        .server
        .post("/wp-admin/admin-ajax.php")
        .add_query_param("action", "vortex_process_transaction")
        .add_header(name.clone(), value.clone())
        .json(&json!({
            "nonce": nonce,
            "type": "tip",
            "recipient_id": 9,
            "amount": 1000,
        }))
        .await
        .json::<Value>();
    assert_eq!(body["success"], false);
    assert_eq!(body["data"]["code"], "security_error");

    // A token minted for another user does not help either
    let nonce = app.nonces.create("vortex_process_transaction", UserId(1));
    let body = app
        .server
        .post("/wp-admin/admin-ajax.php")
        .add_query_param("action", "vortex_process_transaction")
        .add_header(name, value)
        .add_header(
            HeaderName::from_static("x-vortex-user-token"),
            HeaderValue::from_str(&app.nonces.user_token(UserId(9))).unwrap(),
        )
        .json(&json!({
            "nonce": nonce,
            "type": "tip",
            "recipient_id": 9,
            "amount": 1000,
        }))
        .await
        .json::<Value>();
    assert_eq!(body["success"], false);

    assert_eq!(app.balance(1).await, Decimal::new(1000, 0));
    assert_eq!(app.balance(9).await, Decimal::ZERO);
}

// ============ AJAX Guard Tests ============

#[tokio::test]
async fn test_ajax_bad_nonce_is_security_error() {
    let app = create_test_app().await;
    let (name, value) = user_header(1);

    let response = app
        .server
        .post("/wp-admin/admin-ajax.php")
        .add_query_param("action", "vortex_disconnect_wallet")
        .add_header(name, value)
        .json(&json!({"nonce": "0000000000"}))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["success"], false);
    assert_eq!(body["data"]["code"], "security_error");
}

#[tokio::test]
async fn test_ajax_requires_login() {
    let app = create_test_app().await;

    let body = app.ajax("vortex_get_user_huraii_library", 0, json!({})).await;

    assert_eq!(body["success"], false);
    assert_eq!(body["data"]["code"], "auth_error");
}

#[tokio::test]
async fn test_ajax_unknown_action() {
    let app = create_test_app().await;

    let response = app
        .server
        .post("/api/v1/ajax/vortex_nope")
        .json(&json!({}))
        .await;

    let body: Value = response.json();
    assert_eq!(body["success"], false);
    assert_eq!(body["data"]["code"], "invalid_operation");
}

#[tokio::test]
async fn test_ajax_action_from_body() {
    let app = create_test_app().await;
    let nonce = app.nonces.create("vortex_get_license_status", UserId(1));
    let (name, value) = user_header(1);
    let (token_name, token_value) = app.token_header(1);

    let response = app
        .server
        .post("/wp-admin/admin-ajax.php")
        .add_header(name, value)
        .add_header(token_name, token_value)
        .json(&json!({"action": "vortex_get_license_status", "nonce": nonce}))
        .await;

    let body: Value = response.json();
    assert_eq!(body["success"], true, "{body}");
    assert_eq!(body["data"]["status"], "inactive");
}

// ============ Transaction Tests ============

#[tokio::test]
async fn test_transaction_moves_balance() {
    let app = create_test_app().await;
    app.engine
        .transactions
        .award_points(UserId(1), Decimal::new(100, 0), "signup bonus")
        .await
        .unwrap();

    let body = app
        .ajax(
            "vortex_process_transaction",
            1,
            json!({"type": "tip", "recipient_id": "2", "amount": "25"}),
        )
        .await;

    assert_eq!(body["success"], true, "{body}");
    assert_eq!(body["data"]["message"], "Transaction completed successfully");
    assert!(body["data"]["transaction_id"].as_i64().unwrap() > 0);
    assert_eq!(app.balance(1).await, Decimal::new(75, 0));
    assert_eq!(app.balance(2).await, Decimal::new(25, 0));
}

#[tokio::test]
async fn test_transaction_insufficient_balance() {
    let app = create_test_app().await;

    let body = app
        .ajax(
            "vortex_process_transaction",
            1,
            json!({"type": "tip", "recipient_id": 2, "amount": 10}),
        )
        .await;

    assert_eq!(body["success"], false);
    assert_eq!(body["data"]["code"], "insufficient_balance");
    assert_eq!(app.balance(1).await, Decimal::ZERO);
}

#[tokio::test]
async fn test_transaction_rejects_other_currency() {
    let app = create_test_app().await;

    let body = app
        .ajax(
            "vortex_process_transaction",
            1,
            json!({"type": "tip", "recipient_id": 2, "amount": 10, "currency": "ETH"}),
        )
        .await;

    assert_eq!(body["data"]["code"], "invalid_currency");
}

#[tokio::test]
async fn test_transaction_idempotent_replay() {
    let app = create_test_app().await;
    app.engine
        .transactions
        .award_points(UserId(1), Decimal::new(50, 0), "award")
        .await
        .unwrap();
    let request = json!({
        "type": "tip",
        "recipient_id": 2,
        "amount": 5,
        "idempotency_key": "order-17",
    });

    let first = app.ajax("vortex_process_transaction", 1, request.clone()).await;
    let second = app.ajax("vortex_process_transaction", 1, request).await;

    assert_eq!(first["data"]["transaction_id"], second["data"]["transaction_id"]);
    assert_eq!(second["data"]["replayed"], true);
    assert_eq!(app.balance(1).await, Decimal::new(45, 0));
}

#[tokio::test]
async fn test_transaction_missing_type() {
    let app = create_test_app().await;

    let body = app
        .ajax("vortex_process_transaction", 1, json!({"recipient_id": 2, "amount": 1}))
        .await;

    assert_eq!(body["data"]["code"], "input_error");
}

// ============ HURAII Library Tests ============

#[tokio::test]
async fn test_save_image_and_create_nft() {
    let app = create_test_app().await;

    let saved = app
        .ajax(
            "vortex_save_huraii_image",
            3,
            json!({
                "imageURL": "https://cdn.example.com/huraii/sunset.png",
                "prompt": "a sunset over glass towers",
                "mode": "generate",
                "settings": "{\"steps\": 30}",
            }),
        )
        .await;
    assert_eq!(saved["success"], true, "{saved}");
    let image_id = saved["data"]["image_id"].as_i64().unwrap();

    let library = app
        .ajax("vortex_get_user_huraii_library", 3, json!({"page": "1"}))
        .await;
    assert_eq!(library["data"]["total"], 1);
    assert_eq!(library["data"]["images"][0]["id"], image_id);

    let nft = app
        .ajax(
            "vortex_create_nft_from_image",
            3,
            json!({
                "imageId": image_id.to_string(),
                "nftName": "Glass Sunset",
                "royaltyPercentage": "7.5",
                "price": "12",
            }),
        )
        .await;
    assert_eq!(nft["success"], true, "{nft}");
    assert_eq!(nft["data"]["metadata"]["name"], "Glass Sunset");
    assert_eq!(nft["data"]["blockchain_status"], "pending");

    // Another user cannot mint it
    let stolen = app
        .ajax("vortex_create_nft_from_image", 4, json!({"image_id": image_id}))
        .await;
    assert_eq!(stolen["data"]["code"], "invalid_image");
}

#[tokio::test]
async fn test_library_huge_page_number() {
    let app = create_test_app().await;

    let library = app
        .ajax(
            "vortex_get_user_huraii_library",
            3,
            json!({"page": u64::MAX, "limit": u64::MAX}),
        )
        .await;

    assert_eq!(library["success"], true, "{library}");
    assert_eq!(library["data"]["images"].as_array().unwrap().len(), 0);
    assert_eq!(library["data"]["total"], 0);
}

#[tokio::test]
async fn test_save_image_rejects_unsafe_url() {
    let app = create_test_app().await;

    let body = app
        .ajax(
            "vortex_save_huraii_image",
            3,
            json!({"image_url": "javascript:alert(1)"}),
        )
        .await;

    assert_eq!(body["success"], false);
    assert_eq!(body["data"]["code"], "security_error");
}

// ============ Wallet and License Tests ============

#[tokio::test]
async fn test_connect_and_disconnect_wallet() {
    let app = create_test_app().await;

    let connected = app
        .ajax(
            "vortex_connect_wallet",
            5,
            json!({"wallet_address": WALLET, "wallet_type": "metamask"}),
        )
        .await;
    assert_eq!(connected["success"], true, "{connected}");
    assert_eq!(connected["data"]["wallet_address"], "0x5290...9EE7");
    assert_eq!(connected["data"]["full_address"], WALLET);

    let disconnected = app.ajax("vortex_disconnect_wallet", 5, json!({})).await;
    assert_eq!(disconnected["success"], true);
}

#[tokio::test]
async fn test_connect_wallet_bad_address() {
    let app = create_test_app().await;

    let body = app
        .ajax("vortex_connect_wallet", 5, json!({"wallet_address": "0x1234"}))
        .await;

    assert_eq!(body["data"]["code"], "invalid_wallet_address");
}

#[tokio::test]
async fn test_license_lifecycle() {
    let app = create_test_app().await;

    let bad = app
        .ajax("vortex_activate_license", 1, json!({"license_key": "not-a-key"}))
        .await;
    assert_eq!(bad["data"]["code"], "invalid_license_format");

    let active = app
        .ajax(
            "vortex_activate_license",
            1,
            json!({"license_key": "ABCD-1234-EFGH-5678"}),
        )
        .await;
    assert_eq!(active["success"], true, "{active}");
    assert_eq!(active["data"]["status"], "active");

    let inactive = app.ajax("vortex_deactivate_license", 1, json!({})).await;
    assert_eq!(inactive["data"]["status"], "inactive");
}

// ============ Analytics Tracking Tests ============

#[tokio::test]
async fn test_track_analytics_sets_session_cookie() {
    let app = create_test_app().await;
    let nonce = app.nonces.create("vortex_thorius_track_analytics", UserId::ANONYMOUS);

    let response = app
        .server
        .post("/api/v1/ajax/vortex_thorius_track_analytics")
        .json(&json!({
            "nonce": nonce,
            "action_type": "page_view",
            "action_data": "{\"gallery\": 3}",
            "page_url": "https://vortex.example.com/gallery",
        }))
        .await;

    let cookie = response
        .headers()
        .get("set-cookie")
        .and_then(|v| v.to_str().ok())
        .unwrap()
        .to_string();
    let body: Value = response.json();
    assert_eq!(body["success"], true, "{body}");
    assert_eq!(body["data"]["message"], "Analytics tracked");
    let session = body["data"]["session_id"].as_str().unwrap();
    assert!(cookie.starts_with(&format!("vortex_thorius_session={session};")));
}

#[tokio::test]
async fn test_track_analytics_reuses_cookie() {
    let app = create_test_app().await;
    let nonce = app.nonces.create("vortex_thorius_track_analytics", UserId::ANONYMOUS);

    let response = app
        .server
        .post("/api/v1/ajax/vortex_thorius_track_analytics")
        .add_header(
            HeaderName::from_static("cookie"),
            HeaderValue::from_static("vortex_thorius_session=known-session"),
        )
        .json(&json!({"nonce": nonce, "action_type": "search"}))
        .await;

    assert!(response.headers().get("set-cookie").is_none());
    let body: Value = response.json();
    assert_eq!(body["data"]["session_id"], "known-session");
}

#[tokio::test]
async fn test_track_analytics_requires_action_type() {
    let app = create_test_app().await;

    let body = app
        .ajax("vortex_thorius_track_analytics", 0, json!({"page_url": "/"}))
        .await;

    assert_eq!(body["success"], false);
    assert_eq!(body["data"]["code"], "input_error");
}

// ============ SaaS Backend Tests ============

#[tokio::test]
async fn test_saas_missing_and_invalid_key() {
    let app = create_test_app().await;

    let missing = app
        .server
        .post("/analytics")
        .json(&json!({"operation": "market_overview"}))
        .await;
    missing.assert_status_unauthorized();
    assert_eq!(missing.json::<Value>()["error"], "API key is required");

    let invalid = app
        .server
        .post("/analytics")
        .json(&json!({"operation": "market_overview", "api_key": "wrong"}))
        .await;
    invalid.assert_status_unauthorized();
    assert_eq!(invalid.json::<Value>()["error"], "Invalid API key");
}

#[tokio::test]
async fn test_saas_invalid_operation() {
    let app = create_test_app().await;

    let response = app
        .server
        .post("/api/v1/ai/compute")
        .json(&json!({"operation": "mine_bitcoin", "api_key": API_KEY}))
        .await;

    response.assert_status_bad_request();
    assert_eq!(response.json::<Value>()["error"], "Invalid operation");
}

#[tokio::test]
async fn test_saas_analyze_artwork() {
    let app = create_test_app().await;

    let response = app
        .server
        .post("/ai/compute")
        .json(&json!({
            "api_key": API_KEY,
            "operation": "analyze_artwork",
            "artwork_data": {"artwork_id": 12, "price": 250.0},
        }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["artwork_id"], 12);
    assert_eq!(body["data"]["placeholder"], true);
}

#[tokio::test]
async fn test_saas_artist_performance_needs_artist() {
    let app = create_test_app().await;
    let (name, value) = key_header();

    let response = app
        .server
        .post("/analytics")
        .add_header(name, value)
        .json(&json!({"operation": "artist_performance"}))
        .await;

    response.assert_status_bad_request();
    assert_eq!(response.json::<Value>()["error"], "Missing artist_id parameter");
}

#[tokio::test]
async fn test_saas_trend_analysis() {
    let app = create_test_app().await;
    let (name, value) = key_header();

    let response = app
        .server
        .post("/analytics")
        .add_header(name.clone(), value.clone())
        .json(&json!({"operation": "trend_analysis", "metric": "price", "period": "quarterly"}))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["metric"], "price");
    assert_eq!(body["data"]["data_points"].as_array().unwrap().len(), 12);
    assert_eq!(body["data"]["forecast"].as_array().unwrap().len(), 4);

    let bad = app
        .server
        .post("/analytics")
        .add_header(name, value)
        .json(&json!({"operation": "trend_analysis", "period": "hourly"}))
        .await;
    bad.assert_status_bad_request();
}

#[tokio::test]
async fn test_saas_sales_metrics_date_range() {
    let app = create_test_app().await;

    let response = app
        .server
        .post("/analytics")
        .json(&json!({
            "api_key": API_KEY,
            "operation": "sales_metrics",
            "start_date": "2024-03-01",
            "end_date": "2024-03-07",
            "group_by": "week",
        }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["series"].as_array().unwrap().len(), 7);
    assert_eq!(body["data"]["group_by"], "week");
}

#[tokio::test]
async fn test_saas_health_requires_key() {
    let app = create_test_app().await;

    app.server.get("/health").await.assert_status_unauthorized();

    let (name, value) = key_header();
    let response = app.server.get("/api/v1/health").add_header(name, value).await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["success"], true);
}

#[tokio::test]
async fn test_market_predictions() {
    let app = create_test_app().await;
    let (name, value) = key_header();

    let response = app
        .server
        .get("/api/v1/market-predictions")
        .add_query_param("category", "Photography")
        .add_header(name.clone(), value.clone())
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["predictions"].as_array().unwrap().len(), 1);

    let asset = app
        .server
        .get("/market-predictions/asset/artwork-9")
        .add_header(name, value)
        .await;
    asset.assert_status_ok();
    assert_eq!(asset.json::<Value>()["data"]["asset_id"], "artwork-9");
}

#[tokio::test]
async fn test_thorius_trends_and_behavior() {
    let app = create_test_app().await;
    app.ajax("vortex_thorius_track_analytics", 9, json!({"action_type": "page_view"}))
        .await;

    let (name, value) = key_header();
    let behavior = app
        .server
        .get("/api/v1/thorius/users/9/behavior")
        .add_query_param("period", "week")
        .add_header(name.clone(), value.clone())
        .await;
    behavior.assert_status_ok();
    let body: Value = behavior.json();
    assert_eq!(body["data"]["user_id"], 9);
    assert_eq!(body["data"]["total_actions"], 1);

    let trends = app
        .server
        .get("/api/v1/thorius/trends")
        .add_header(name, value)
        .await;
    trends.assert_status_ok();
}
