//! Admission and transaction submission DTOs.

use serde::Deserialize;
use utoipa::ToSchema;

use crate::domain::TransactionOutput;
use crate::error::OverlayError;

/// One transaction output as sent by the overlay host.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OutputDto {
    /// Value in satoshis.
    pub satoshis: u64,
    /// Hex-encoded locking script.
    pub locking_script: String,
}

impl OutputDto {
    /// Decodes the hex locking script.
    ///
    /// # Errors
    ///
    /// Returns [`OverlayError::InvalidRequest`] if the script is not hex.
    pub fn to_output(&self) -> Result<TransactionOutput, OverlayError> {
        let locking_script = decode_script(&self.locking_script)?;
        Ok(TransactionOutput::new(self.satoshis, locking_script))
    }
}

/// Decodes a hex locking script.
///
/// # Errors
///
/// Returns [`OverlayError::InvalidRequest`] if the string is not hex.
pub fn decode_script(hex_script: &str) -> Result<Vec<u8>, OverlayError> {
    hex::decode(hex_script)
        .map_err(|e| OverlayError::InvalidRequest(format!("lockingScript is not hex: {e}")))
}

/// Converts every output, failing on the first bad one.
///
/// # Errors
///
/// Returns [`OverlayError::InvalidRequest`] naming the offending index.
pub fn to_outputs(outputs: &[OutputDto]) -> Result<Vec<TransactionOutput>, OverlayError> {
    outputs
        .iter()
        .enumerate()
        .map(|(index, dto)| {
            dto.to_output().map_err(|e| {
                OverlayError::InvalidRequest(format!("output {index}: {e}"))
            })
        })
        .collect()
}

/// Request body for `POST /api/v1/admissions`.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IdentifyAdmissibleRequest {
    /// Outputs of the transaction, in order.
    pub outputs: Vec<OutputDto>,
}

/// Request body for `POST /api/v1/transactions`.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitTransactionRequest {
    /// Transaction id the outputs belong to.
    pub txid: String,
    /// Outputs of the transaction, in order.
    pub outputs: Vec<OutputDto>,
}
