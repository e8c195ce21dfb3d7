//! Admission handlers: pure admission decisions and transaction submission.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};

use crate::admission::AdmittanceInstructions;
use crate::api::dto::{IdentifyAdmissibleRequest, SubmitTransactionRequest, to_outputs};
use crate::app_state::AppState;
use crate::error::{ErrorResponse, OverlayError};

/// `POST /admissions` — Decide which outputs are admissible.
///
/// # Errors
///
/// Returns [`OverlayError::InvalidRequest`] if a locking script is not hex.
#[utoipa::path(
    post,
    path = "/api/v1/admissions",
    tag = "Admission",
    summary = "Identify admissible outputs",
    description = "Runs admission over the outputs of one transaction and returns the indices that would be admitted. Nothing is indexed.",
    request_body = IdentifyAdmissibleRequest,
    responses(
        (status = 200, description = "Admission decision", body = AdmittanceInstructions),
        (status = 400, description = "Malformed request", body = ErrorResponse),
    )
)]
pub async fn identify_admissible_outputs(
    State(state): State<AppState>,
    Json(req): Json<IdentifyAdmissibleRequest>,
) -> Result<impl IntoResponse, OverlayError> {
    let outputs = to_outputs(&req.outputs)?;
    let instructions = state.overlay_service.identify_admissible_outputs(&outputs);
    Ok((StatusCode::OK, Json(instructions)))
}

/// `POST /transactions` — Admit and index a transaction.
///
/// # Errors
///
/// Returns [`OverlayError::InvalidRequest`] on a bad body, or a storage
/// error naming the admitted outputs that could not be indexed. Resubmitting
/// the same transaction is safe.
#[utoipa::path(
    post,
    path = "/api/v1/transactions",
    tag = "Admission",
    summary = "Submit a transaction",
    description = "Admits the outputs of a transaction and indexes every admitted record under `txid`. Outputs already indexed count as admitted, so a failed submission can be retried.",
    request_body = SubmitTransactionRequest,
    responses(
        (status = 200, description = "Outputs admitted and indexed", body = AdmittanceInstructions),
        (status = 400, description = "Malformed request", body = ErrorResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse),
    )
)]
pub async fn submit_transaction(
    State(state): State<AppState>,
    Json(req): Json<SubmitTransactionRequest>,
) -> Result<impl IntoResponse, OverlayError> {
    if req.txid.is_empty() {
        return Err(OverlayError::InvalidRequest("txid is empty".to_string()));
    }
    let outputs = to_outputs(&req.outputs)?;
    let instructions = state
        .overlay_service
        .submit_transaction(&req.txid, &outputs)
        .await?;
    Ok((StatusCode::OK, Json(instructions)))
}

/// Admission routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/admissions", post(identify_admissible_outputs))
        .route("/transactions", post(submit_transaction))
}
