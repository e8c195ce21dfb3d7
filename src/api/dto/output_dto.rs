//! Output lifecycle DTOs: admitted, spent, evicted.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::Outpoint;

/// Request body for `POST /api/v1/outputs/admitted`.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OutputAdmittedRequest {
    /// Topic the host admitted the output under.
    pub topic: String,
    /// Transaction id.
    pub txid: String,
    /// Output index.
    pub output_index: u32,
    /// Hex-encoded locking script.
    pub locking_script: String,
}

/// Request body for `POST /api/v1/outputs/spent`.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OutputSpentRequest {
    /// Topic the output was admitted under.
    pub topic: String,
    /// Transaction id.
    pub txid: String,
    /// Output index.
    pub output_index: u32,
}

/// Request body for `POST /api/v1/outputs/evicted`.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OutputEvictedRequest {
    /// Transaction id.
    pub txid: String,
    /// Output index.
    pub output_index: u32,
}

/// Response for output lifecycle notifications.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OutputEventResponse {
    /// Outpoint the notification was about.
    pub outpoint: Outpoint,
    /// Records indexed by this call.
    pub indexed: u64,
    /// Records removed by this call.
    pub removed: u64,
}
