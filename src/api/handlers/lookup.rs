//! Lookup handlers: queries, service metadata and documentation.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::LookupRequest;
use crate::app_state::AppState;
use crate::domain::Outpoint;
use crate::error::{ErrorResponse, OverlayError};
use crate::service::{OverlayDocumentation, OverlayMetadata};

/// `POST /lookup` — Answer a lookup question.
///
/// # Errors
///
/// Returns [`OverlayError::UnsupportedService`],
/// [`OverlayError::UnsupportedQuery`] or a parameter error.
#[utoipa::path(
    post,
    path = "/api/v1/lookup",
    tag = "Lookup",
    summary = "Lookup query",
    description = "Runs a named query (getAllTopics, getTopic, getAllPosts, getPost, getAllReactions, getAllReplies, getReactionByTxid, getPaymentsFor) and returns matching outpoints in admission order.",
    request_body = LookupRequest,
    responses(
        (status = 200, description = "Matching outpoints", body = Vec<Outpoint>),
        (status = 400, description = "Unsupported service or query, bad parameter", body = ErrorResponse),
    )
)]
pub async fn lookup(
    State(state): State<AppState>,
    Json(req): Json<LookupRequest>,
) -> Result<impl IntoResponse, OverlayError> {
    let outpoints = state
        .overlay_service
        .lookup(&req.service, &req.query.query, req.query.parameter.as_ref())
        .await?;
    Ok((StatusCode::OK, Json(outpoints)))
}

/// `GET /metadata` — Topic manager and lookup service metadata.
#[utoipa::path(
    get,
    path = "/api/v1/metadata",
    tag = "Lookup",
    summary = "Overlay metadata",
    description = "Returns identifiers, names and descriptions of the topic manager and the lookup service.",
    responses(
        (status = 200, description = "Overlay metadata", body = OverlayMetadata),
    )
)]
pub async fn metadata(State(state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(state.overlay_service.metadata()))
}

/// `GET /documentation` — Topic manager and lookup service documentation.
#[utoipa::path(
    get,
    path = "/api/v1/documentation",
    tag = "Lookup",
    summary = "Overlay documentation",
    description = "Returns Markdown documentation of the record layouts, admission rules and lookup queries.",
    responses(
        (status = 200, description = "Overlay documentation", body = OverlayDocumentation),
    )
)]
pub async fn documentation(State(state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(state.overlay_service.documentation()))
}

/// Lookup routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/lookup", post(lookup))
        .route("/metadata", get(metadata))
        .route("/documentation", get(documentation))
}
