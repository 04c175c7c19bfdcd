//! AJAX Action Handlers
//!
//! `POST /wp-admin/admin-ajax.php?action=<name>` and
//! `POST /api/v1/ajax/<name>`. Every action checks the `nonce` field first
//! and, except analytics tracking, requires a logged-in user. Responses are
//! always HTTP 200 with a `{success, data}` envelope.

use axum::{
    body::Bytes,
    extract::{ConnectInfo, Path, Query, State},
    http::{header, HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
};
use rust_decimal::Decimal;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::instrument;
use vortex_core::{
    lenient, FeeArrangement, Network, NftFromImage, SessionId, TrackEvent, TransactionRequest,
    TransactionType, UserId, VortexError,
};
use vortex_engine::library::DEFAULT_PAGE_SIZE;
use vortex_engine::SaveImageRequest;

use crate::auth::{client_ip, current_user, session_cookie, session_from_cookie, user_agent};
use crate::error::{AjaxResponse, ApiError, ApiResult};
use crate::nonce::NonceIssuer;
use crate::state::AppState;

/// Registered AJAX actions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AjaxAction {
    ProcessTransaction,
    SaveHuraiiImage,
    CreateNftFromImage,
    GetUserHuraiiLibrary,
    ConnectWallet,
    DisconnectWallet,
    ActivateLicense,
    DeactivateLicense,
    TrackAnalytics,
    GetTolaBalance,
    GetLicenseStatus,
}

impl AjaxAction {
    pub const ALL: [AjaxAction; 11] = [
        AjaxAction::ProcessTransaction,
        AjaxAction::SaveHuraiiImage,
        AjaxAction::CreateNftFromImage,
        AjaxAction::GetUserHuraiiLibrary,
        AjaxAction::ConnectWallet,
        AjaxAction::DisconnectWallet,
        AjaxAction::ActivateLicense,
        AjaxAction::DeactivateLicense,
        AjaxAction::TrackAnalytics,
        AjaxAction::GetTolaBalance,
        AjaxAction::GetLicenseStatus,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AjaxAction::ProcessTransaction => "vortex_process_transaction",
            AjaxAction::SaveHuraiiImage => "vortex_save_huraii_image",
            AjaxAction::CreateNftFromImage => "vortex_create_nft_from_image",
            AjaxAction::GetUserHuraiiLibrary => "vortex_get_user_huraii_library",
            AjaxAction::ConnectWallet => "vortex_connect_wallet",
            AjaxAction::DisconnectWallet => "vortex_disconnect_wallet",
            AjaxAction::ActivateLicense => "vortex_activate_license",
            AjaxAction::DeactivateLicense => "vortex_deactivate_license",
            AjaxAction::TrackAnalytics => "vortex_thorius_track_analytics",
            AjaxAction::GetTolaBalance => "vortex_get_tola_balance",
            AjaxAction::GetLicenseStatus => "vortex_get_license_status",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.as_str() == name)
    }

    /// Anonymous visitors may only report analytics
    pub fn requires_login(&self) -> bool {
        !matches!(self, AjaxAction::TrackAnalytics)
    }

    /// Verb used in the "You must be logged in to ..." message
    fn login_purpose(&self) -> &'static str {
        match self {
            AjaxAction::ProcessTransaction => "make transactions",
            AjaxAction::SaveHuraiiImage => "save images",
            AjaxAction::CreateNftFromImage => "create NFTs",
            AjaxAction::GetUserHuraiiLibrary => "view your library",
            AjaxAction::ConnectWallet | AjaxAction::DisconnectWallet => "manage your wallet",
            AjaxAction::ActivateLicense
            | AjaxAction::DeactivateLicense
            | AjaxAction::GetLicenseStatus => "manage the license",
            AjaxAction::GetTolaBalance => "view your balance",
            AjaxAction::TrackAnalytics => "track analytics",
        }
    }
}

/// Caller identity resolved from headers
#[derive(Debug, Clone)]
pub struct AjaxContext {
    pub user: UserId,
    pub ip: String,
    pub user_agent: String,
    pub session: Option<SessionId>,
}

impl AjaxContext {
    pub fn from_headers(
        headers: &HeaderMap,
        peer: Option<SocketAddr>,
        nonces: &NonceIssuer,
    ) -> Self {
        Self {
            user: current_user(headers, nonces),
            ip: client_ip(headers, peer),
            user_agent: user_agent(headers),
            session: session_from_cookie(headers),
        }
    }
}

/// Successful action result plus an optional `Set-Cookie`
struct ActionOutcome {
    data: Value,
    set_cookie: Option<String>,
}

impl From<Value> for ActionOutcome {
    fn from(data: Value) -> Self {
        Self {
            data,
            set_cookie: None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AjaxQuery {
    pub action: Option<String>,
}

/// `POST /wp-admin/admin-ajax.php`
pub async fn admin_ajax(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AjaxQuery>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let ctx = AjaxContext::from_headers(&headers, connect_info.map(|ci| ci.0), &state.nonces);
    handle(&state, query.action, ctx, &body).await
}

/// `POST /api/v1/ajax/:action`
pub async fn ajax_action(
    State(state): State<Arc<AppState>>,
    Path(action): Path<String>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let ctx = AjaxContext::from_headers(&headers, connect_info.map(|ci| ci.0), &state.nonces);
    handle(&state, Some(action), ctx, &body).await
}

async fn handle(state: &AppState, action: Option<String>, ctx: AjaxContext, body: &[u8]) -> Response {
    let debug = state.debug();
    let result = match parse_body(body) {
        Ok(form) => {
            let name = action.or_else(|| {
                form.get("action")
                    .and_then(Value::as_str)
                    .map(str::to_string)
            });
            match name.as_deref().and_then(AjaxAction::parse) {
                Some(action) => run_action(state, action, &ctx, &form).await,
                None => Err(ApiError::InvalidOperation),
            }
        }
        Err(e) => Err(e),
    };

    match result {
        Ok(outcome) => {
            let mut response = AjaxResponse::ok(outcome.data).into_response();
            if let Some(cookie) = outcome.set_cookie {
                match HeaderValue::from_str(&cookie) {
                    Ok(value) => {
                        response.headers_mut().insert(header::SET_COOKIE, value);
                    }
                    Err(e) => tracing::warn!(error = %e, "session cookie not representable"),
                }
            }
            response
        }
        Err(e) => e.into_ajax(debug).into_response(),
    }
}

/// JSON object body; an empty body is an empty form
fn parse_body(body: &[u8]) -> ApiResult<Value> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(json!({}));
    }
    match serde_json::from_slice::<Value>(body) {
        Ok(value @ Value::Object(_)) => Ok(value),
        Ok(_) => Err(ApiError::bad_request("Request body must be a JSON object")),
        Err(e) => Err(ApiError::bad_request(format!("Invalid JSON body: {e}"))),
    }
}

fn form<T: DeserializeOwned>(body: &Value) -> ApiResult<T> {
    serde_json::from_value(body.clone())
        .map_err(|e| ApiError::bad_request(format!("Invalid request: {e}")))
}

fn to_data<T: Serialize>(value: &T) -> ApiResult<Value> {
    serde_json::to_value(value)
        .map_err(|e| VortexError::SerializationError(e.to_string()).into())
}

fn with_message(mut data: Value, message: &str) -> Value {
    if let Value::Object(map) = &mut data {
        map.insert("message".to_string(), Value::String(message.to_string()));
    }
    data
}

#[instrument(skip(state, ctx, body), fields(action = action.as_str(), user_id = %ctx.user))]
async fn run_action(
    state: &AppState,
    action: AjaxAction,
    ctx: &AjaxContext,
    body: &Value,
) -> ApiResult<ActionOutcome> {
    let nonce = body.get("nonce").and_then(Value::as_str).unwrap_or_default();
    if !state.nonces.verify(action.as_str(), ctx.user, nonce) {
        return Err(VortexError::SecurityCheckFailed.into());
    }
    if action.requires_login() && ctx.user.is_anonymous() {
        return Err(VortexError::not_logged_in(action.login_purpose()).into());
    }

    let data = match action {
        AjaxAction::ProcessTransaction => process_transaction(state, ctx, body).await?,
        AjaxAction::SaveHuraiiImage => save_huraii_image(state, ctx, body).await?,
        AjaxAction::CreateNftFromImage => create_nft_from_image(state, ctx, body).await?,
        AjaxAction::GetUserHuraiiLibrary => get_user_huraii_library(state, ctx, body).await?,
        AjaxAction::ConnectWallet => connect_wallet(state, ctx, body).await?,
        AjaxAction::DisconnectWallet => disconnect_wallet(state, ctx).await?,
        AjaxAction::ActivateLicense => activate_license(state, body).await?,
        AjaxAction::DeactivateLicense => deactivate_license(state).await?,
        AjaxAction::TrackAnalytics => return track_analytics(state, ctx, body).await,
        AjaxAction::GetTolaBalance => get_tola_balance(state, ctx).await?,
        AjaxAction::GetLicenseStatus => license_status(state).await?,
    };
    Ok(data.into())
}

type ActionResult = ApiResult<Value>;

// ============================================================
// Transactions and balance
// ============================================================

#[derive(Debug, Deserialize)]
struct TransactionForm {
    #[serde(default, rename = "type", alias = "transaction_type")]
    tx_type: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_u64")]
    recipient_id: Option<u64>,
    #[serde(default, deserialize_with = "lenient::opt_decimal")]
    amount: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    item_id: Option<i64>,
    #[serde(default)]
    currency: Option<String>,
    #[serde(default)]
    fee_arrangement: Option<String>,
    #[serde(default)]
    idempotency_key: Option<String>,
}

async fn process_transaction(state: &AppState, ctx: &AjaxContext, body: &Value) -> ActionResult {
    let form: TransactionForm = form(body)?;
    let tx_type = form
        .tx_type
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| VortexError::missing("type"))?;

    // Missing amount and recipient are left to the service so currency is checked first
    let mut request = TransactionRequest::new(
        TransactionType::parse(tx_type.trim()),
        ctx.user,
        UserId(form.recipient_id.unwrap_or_default()),
        form.amount.unwrap_or_default(),
    )
    .with_client_ip(ctx.ip.clone());
    if let Some(item_id) = form.item_id {
        request = request.with_item(item_id);
    }
    if let Some(currency) = form.currency.filter(|c| !c.is_empty()) {
        request = request.with_currency(currency);
    }
    if let Some(arrangement) = form.fee_arrangement {
        request = request.with_fee_arrangement(FeeArrangement::parse_lenient(&arrangement));
    }
    if let Some(key) = form.idempotency_key.filter(|k| !k.trim().is_empty()) {
        request = request.with_idempotency_key(key.trim());
    }

    let receipt = state.engine.transactions.process_transaction(request).await?;
    Ok(with_message(to_data(&receipt)?, "Transaction completed successfully"))
}

async fn get_tola_balance(state: &AppState, ctx: &AjaxContext) -> ActionResult {
    let balance = state.engine.wallets.get_user_tola_balance(ctx.user).await?;
    Ok(json!({ "balance": balance, "currency": vortex_core::TOLA }))
}

// ============================================================
// HURAII library
// ============================================================

#[derive(Debug, Deserialize)]
struct SaveImageForm {
    #[serde(default, alias = "imageURL")]
    image_url: String,
    #[serde(default)]
    prompt: String,
    #[serde(default)]
    mode: String,
    #[serde(default)]
    style: String,
    #[serde(default)]
    technique: String,
    #[serde(default)]
    settings: Value,
    #[serde(default, alias = "sourceURL")]
    source_url: String,
}

async fn save_huraii_image(state: &AppState, ctx: &AjaxContext, body: &Value) -> ActionResult {
    let form: SaveImageForm = form(body)?;
    // Form posts send settings as a JSON string
    let settings = match form.settings {
        Value::String(raw) => serde_json::from_str(&raw).unwrap_or(Value::Null),
        other => other,
    };
    let request = SaveImageRequest {
        image_url: form.image_url,
        prompt: form.prompt,
        mode: form.mode,
        style: form.style,
        technique: form.technique,
        settings,
        source_url: form.source_url,
    };
    let image = state.engine.library.save_image(ctx.user, request).await?;
    Ok(json!({
        "image_id": image.id,
        "image_url": image.image_url,
        "title": image.title,
        "message": "Image saved to your library",
    }))
}

#[derive(Debug, Deserialize)]
struct NftForm {
    #[serde(default, alias = "imageId", deserialize_with = "lenient::opt_i64")]
    image_id: Option<i64>,
    #[serde(default, alias = "nftName")]
    name: Option<String>,
    #[serde(default, alias = "nftDescription")]
    description: Option<String>,
    #[serde(default, alias = "royaltyPercentage", deserialize_with = "lenient::opt_decimal")]
    royalty: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient::opt_decimal")]
    price: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient::opt_u64")]
    quantity: Option<u64>,
}

async fn create_nft_from_image(state: &AppState, ctx: &AjaxContext, body: &Value) -> ActionResult {
    let form: NftForm = form(body)?;
    let image_id = form
        .image_id
        .filter(|id| *id > 0)
        .ok_or_else(|| VortexError::missing("image_id"))?;

    let defaults = NftFromImage::default();
    let metadata = NftFromImage {
        name: form.name.filter(|n| !n.trim().is_empty()),
        description: form.description.unwrap_or_default(),
        royalty: form.royalty.unwrap_or(defaults.royalty),
        price: form.price.unwrap_or(defaults.price),
        quantity: form.quantity.unwrap_or(defaults.quantity),
    };
    let draft = state
        .engine
        .library
        .create_nft_from_image(ctx.user, image_id, metadata)
        .await?;
    Ok(with_message(to_data(&draft)?, "NFT prepared for minting"))
}

#[derive(Debug, Deserialize)]
struct LibraryForm {
    #[serde(default, deserialize_with = "lenient::opt_u64")]
    page: Option<u64>,
    #[serde(default, deserialize_with = "lenient::opt_u64")]
    limit: Option<u64>,
}

async fn get_user_huraii_library(state: &AppState, ctx: &AjaxContext, body: &Value) -> ActionResult {
    let form: LibraryForm = form(body)?;
    let page = form
        .page
        .map_or(1, |p| usize::try_from(p).unwrap_or(usize::MAX));
    let limit = form
        .limit
        .map_or(DEFAULT_PAGE_SIZE, |l| usize::try_from(l).unwrap_or(usize::MAX));
    let library = state
        .engine
        .library
        .get_user_library(ctx.user, page, limit)
        .await?;
    to_data(&library)
}

// ============================================================
// Wallets
// ============================================================

#[derive(Debug, Deserialize)]
struct WalletForm {
    #[serde(default, alias = "address")]
    wallet_address: String,
    #[serde(default)]
    wallet_type: Option<String>,
    #[serde(default)]
    network: Option<String>,
}

async fn connect_wallet(state: &AppState, ctx: &AjaxContext, body: &Value) -> ActionResult {
    let form: WalletForm = form(body)?;
    let network = form
        .network
        .filter(|n| !n.trim().is_empty())
        .map(|n| Network::parse(n.trim()))
        .unwrap_or_else(|| state.engine.blockchain.network().clone());
    let wallet_type = form.wallet_type.filter(|t| !t.trim().is_empty());

    let connected = state
        .engine
        .wallets
        .connect_wallet(ctx.user, form.wallet_address.trim(), wallet_type.as_deref(), network)
        .await?;
    Ok(json!({
        "wallet_address": connected.formatted_address,
        "full_address": connected.binding.address,
        "wallet_type": connected.binding.wallet_type,
        "network": connected.binding.network,
        "message": "Wallet connected successfully",
    }))
}

async fn disconnect_wallet(state: &AppState, ctx: &AjaxContext) -> ActionResult {
    state.engine.wallets.disconnect_wallet(ctx.user).await?;
    Ok(json!({ "message": "Wallet disconnected successfully" }))
}

// ============================================================
// License
// ============================================================

#[derive(Debug, Deserialize)]
struct LicenseForm {
    #[serde(default)]
    license_key: String,
}

async fn activate_license(state: &AppState, body: &Value) -> ActionResult {
    let form: LicenseForm = form(body)?;
    let summary = state.engine.licenses.activate_license(&form.license_key).await?;
    Ok(with_message(to_data(&summary)?, "License activated successfully"))
}

async fn deactivate_license(state: &AppState) -> ActionResult {
    let summary = state.engine.licenses.deactivate_license().await?;
    Ok(with_message(to_data(&summary)?, "License deactivated successfully"))
}

async fn license_status(state: &AppState) -> ActionResult {
    let summary = state.engine.licenses.license_status().await?;
    to_data(&summary)
}

// ============================================================
// Thorius analytics
// ============================================================

#[derive(Debug, Deserialize)]
struct TrackForm {
    #[serde(default)]
    action_type: String,
    #[serde(default)]
    action_data: Value,
    #[serde(default)]
    page_url: String,
    #[serde(default)]
    referrer: String,
    #[serde(default)]
    session_id: Option<String>,
}

async fn track_analytics(
    state: &AppState,
    ctx: &AjaxContext,
    body: &Value,
) -> ApiResult<ActionOutcome> {
    let form: TrackForm = form(body)?;
    let action_data = match form.action_data {
        Value::String(raw) => serde_json::from_str(&raw).unwrap_or(Value::String(raw)),
        Value::Null => json!({}),
        other => other,
    };
    // Cookie first, then a client-supplied id; the cookie is (re)set when absent
    let fresh = ctx.session.is_none();
    let session = ctx
        .session
        .clone()
        .or_else(|| {
            form.session_id
                .as_deref()
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(SessionId::new)
        })
        .unwrap_or_else(SessionId::generate);

    let event_id = state
        .engine
        .analytics
        .track_event(TrackEvent {
            user_id: ctx.user,
            session_id: session.clone(),
            action_type: form.action_type,
            action_data,
            page_url: form.page_url,
            referrer: form.referrer,
            ip_address: ctx.ip.clone(),
            user_agent: ctx.user_agent.clone(),
        })
        .await?;

    let data = json!({
        "event_id": event_id,
        "session_id": session.as_str(),
        "message": "Analytics tracked",
    });
    Ok(ActionOutcome {
        data,
        set_cookie: fresh.then(|| session_cookie(&session)),
    })
}
