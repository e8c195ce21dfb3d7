//! Lookup query DTOs.

use serde::Deserialize;
use serde_json::Value;
use utoipa::ToSchema;

/// Query part of a lookup request.
#[derive(Debug, Deserialize, ToSchema)]
pub struct LookupQueryDto {
    /// Query name, e.g. `getTopic`.
    pub query: String,
    /// Query parameter; a string, or `{txid, outputIndex}` for
    /// `getReactionByTxid`.
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub parameter: Option<Value>,
}

/// Request body for `POST /api/v1/lookup`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct LookupRequest {
    /// Lookup service identifier, e.g. `ls_testforum1`.
    pub service: String,
    /// The question.
    pub query: LookupQueryDto,
}
