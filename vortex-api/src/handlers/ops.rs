//! Ops Handlers
//!
//! Unauthenticated health probe, keyed AJAX nonce issuing and the
//! Prometheus scrape endpoint.

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use vortex_core::{UserId, VortexError};

use crate::auth::api_key_from;
use crate::dto::{HealthResponse, NonceResponse};
use crate::error::ApiResult;
use crate::handlers::ajax::AjaxAction;
use crate::state::AppState;

/// Build the health body; 503 when the database is unreachable
pub async fn health_report(state: &AppState) -> (StatusCode, HealthResponse) {
    let health = state.engine.health().await;
    let response = HealthResponse::from_engine(
        &state.config.service_name,
        &state.config.version,
        &health,
        &state.metrics_summary(),
    );
    let status = if response.is_unhealthy() {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };
    (status, response)
}

/// `GET /healthz`
pub async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let (status, body) = health_report(&state).await;
    (status, Json(body))
}

#[derive(Debug, Deserialize)]
pub struct NonceQuery {
    pub action: Option<String>,
    pub user_id: Option<String>,
}

/// `GET /api/v1/nonce?action=&user_id=`
///
/// Called server to server by the fronting site with its API key. The
/// response carries the action nonce and, for a logged-in user, the token
/// that authenticates `X-Vortex-User`.
pub async fn issue_nonce(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<NonceQuery>,
) -> ApiResult<Json<NonceResponse>> {
    state
        .auth_config
        .authorize(api_key_from(&headers, None).as_deref())?;
    let action = query
        .action
        .as_deref()
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .ok_or_else(|| VortexError::missing("action"))?;
    if AjaxAction::parse(action).is_none() {
        return Err(VortexError::invalid("action", "unknown AJAX action").into());
    }
    let user = match query.user_id.as_deref().map(str::trim) {
        None | Some("") => UserId::ANONYMOUS,
        Some(raw) => raw
            .parse()
            .map(UserId)
            .map_err(|_| VortexError::invalid("user_id", "must be a non-negative integer"))?,
    };

    Ok(Json(NonceResponse {
        nonce: state.nonces.create(action, user),
        action: action.to_string(),
        user_id: user.0,
        user_token: (!user.is_anonymous()).then(|| state.nonces.user_token(user)),
    }))
}

/// `GET /metrics`
pub async fn prometheus_metrics(State(state): State<Arc<AppState>>) -> Response {
    match &state.prometheus {
        Some(handle) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => (StatusCode::NOT_FOUND, "metrics disabled").into_response(),
    }
}
