//! System endpoints: health check and emoji price configuration.

use std::collections::BTreeMap;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use crate::app_state::AppState;

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
struct HealthResponse {
    status: String,
    timestamp: String,
    version: String,
}

/// `GET /health` — Service health status.
#[utoipa::path(
    get,
    path = "/health",
    tag = "System",
    summary = "Health check",
    description = "Returns service health status, version, and current timestamp.",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
    )
)]
pub async fn health_handler() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
            timestamp: Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }),
    )
}

/// `GET /config/emoji-prices` — Required payout per emoji.
#[utoipa::path(
    get,
    path = "/config/emoji-prices",
    tag = "System",
    summary = "Emoji price table",
    description = "Returns the payout, in satoshis, a reaction with each emoji must carry.",
    responses(
        (status = 200, description = "Emoji prices", body = BTreeMap<String, u64>),
    )
)]
pub async fn emoji_prices_handler(State(state): State<AppState>) -> impl IntoResponse {
    let prices: BTreeMap<String, u64> = state
        .overlay_service
        .config()
        .emoji_prices
        .iter()
        .map(|(emoji, sats)| (emoji.to_string(), sats))
        .collect();
    (StatusCode::OK, Json(prices))
}

/// System routes mounted at the root level (not under /api/v1).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_handler))
        .route("/config/emoji-prices", get(emoji_prices_handler))
}
