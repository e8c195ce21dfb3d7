//! Output lifecycle handlers: admitted, spent, evicted.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};

use crate::api::dto::{
    OutputAdmittedRequest, OutputEventResponse, OutputEvictedRequest, OutputSpentRequest,
    decode_script,
};
use crate::app_state::AppState;
use crate::domain::Outpoint;
use crate::error::{ErrorResponse, OverlayError};

/// `POST /outputs/admitted` — Index an output the host admitted.
///
/// # Errors
///
/// Returns [`OverlayError::MalformedOutput`] if the script does not decode
/// into a record, [`OverlayError::DuplicateOutpoint`] if already indexed.
#[utoipa::path(
    post,
    path = "/api/v1/outputs/admitted",
    tag = "Outputs",
    summary = "Output admitted by topic",
    description = "Decodes the output and indexes its record. Outputs admitted under another topic are ignored.",
    request_body = OutputAdmittedRequest,
    responses(
        (status = 200, description = "Notification handled", body = OutputEventResponse),
        (status = 400, description = "Malformed output", body = ErrorResponse),
        (status = 409, description = "Outpoint already indexed", body = ErrorResponse),
    )
)]
pub async fn output_admitted(
    State(state): State<AppState>,
    Json(req): Json<OutputAdmittedRequest>,
) -> Result<impl IntoResponse, OverlayError> {
    let script = decode_script(&req.locking_script)?;
    let outpoint = Outpoint::new(req.txid, req.output_index);
    let indexed = state
        .overlay_service
        .output_admitted(&req.topic, outpoint.clone(), &script)
        .await?;
    Ok((
        StatusCode::OK,
        Json(OutputEventResponse {
            outpoint,
            indexed: u64::from(indexed),
            removed: 0,
        }),
    ))
}

/// `POST /outputs/spent` — Remove a spent output from the index.
#[utoipa::path(
    post,
    path = "/api/v1/outputs/spent",
    tag = "Outputs",
    summary = "Output spent",
    description = "Removes the record at the outpoint from every collection. Unknown outpoints are a no-op.",
    request_body = OutputSpentRequest,
    responses(
        (status = 200, description = "Notification handled", body = OutputEventResponse),
    )
)]
pub async fn output_spent(
    State(state): State<AppState>,
    Json(req): Json<OutputSpentRequest>,
) -> impl IntoResponse {
    let outpoint = Outpoint::new(req.txid, req.output_index);
    let removed = state
        .overlay_service
        .output_spent(&req.topic, &outpoint)
        .await;
    (
        StatusCode::OK,
        Json(OutputEventResponse {
            outpoint,
            indexed: 0,
            removed,
        }),
    )
}

/// `POST /outputs/evicted` — Evict an output from the index.
#[utoipa::path(
    post,
    path = "/api/v1/outputs/evicted",
    tag = "Outputs",
    summary = "Output evicted",
    description = "Removes the record at the outpoint from every collection. Unknown outpoints are a no-op.",
    request_body = OutputEvictedRequest,
    responses(
        (status = 200, description = "Notification handled", body = OutputEventResponse),
    )
)]
pub async fn output_evicted(
    State(state): State<AppState>,
    Json(req): Json<OutputEvictedRequest>,
) -> impl IntoResponse {
    let outpoint = Outpoint::new(req.txid, req.output_index);
    let removed = state.overlay_service.output_evicted(&outpoint).await;
    (
        StatusCode::OK,
        Json(OutputEventResponse {
            outpoint,
            indexed: 0,
            removed,
        }),
    )
}

/// Output lifecycle routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/outputs/admitted", post(output_admitted))
        .route("/outputs/spent", post(output_spent))
        .route("/outputs/evicted", post(output_evicted))
}
