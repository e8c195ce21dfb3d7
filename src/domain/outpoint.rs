//! Transaction output reference.
//!
//! [`Outpoint`] is the primary key of every indexed record and the unit of
//! deletion for spend and eviction notifications.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::OverlayError;

/// Unique reference to a ledger output: `(txid, outputIndex)`.
///
/// Serialized in the overlay wire shape `{"txid": "...", "outputIndex": 0}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Outpoint {
    /// Hex transaction id.
    pub txid: String,
    /// Position of the output inside the transaction.
    pub output_index: u32,
}

impl Outpoint {
    /// Creates an outpoint from a txid and an output index.
    #[must_use]
    pub fn new(txid: impl Into<String>, output_index: u32) -> Self {
        Self {
            txid: txid.into(),
            output_index,
        }
    }
}

impl fmt::Display for Outpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.txid, self.output_index)
    }
}

impl FromStr for Outpoint {
    type Err = OverlayError;

    /// Parses the `<txid>.<outputIndex>` form produced by [`fmt::Display`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (txid, index) = s
            .rsplit_once('.')
            .ok_or_else(|| OverlayError::InvalidRequest(format!("invalid outpoint: {s}")))?;
        if txid.is_empty() {
            return Err(OverlayError::InvalidRequest(format!(
                "invalid outpoint: {s}"
            )));
        }
        let output_index = index
            .parse()
            .map_err(|_| OverlayError::InvalidRequest(format!("invalid output index: {index}")))?;
        Ok(Self::new(txid, output_index))
    }
}
