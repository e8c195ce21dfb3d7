//! Per-transaction admission decisions.

use std::sync::Arc;

use serde::Serialize;
use utoipa::ToSchema;

use crate::codec::FieldDecoder;
use crate::config::ProtocolConfig;
use crate::domain::{Record, TransactionOutput};

use super::payout::PayoutVerifier;
use super::reject::RejectReason;
use super::validator::RecordValidator;

/// Result of admitting one transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdmittanceInstructions {
    /// Indices of admitted outputs, ascending.
    pub outputs_to_admit: Vec<u32>,
    /// Previously admitted coins to keep. Always empty for this overlay.
    pub coins_to_retain: Vec<u32>,
}

/// Decides which outputs of a transaction join the overlay.
///
/// Each output is judged on its own: a malformed output never prevents its
/// siblings from being admitted.
#[derive(Debug, Clone)]
pub struct AdmissionDecider {
    decoder: Arc<dyn FieldDecoder>,
    validator: RecordValidator,
    payout: PayoutVerifier,
}

impl AdmissionDecider {
    /// Wires the decider from a policy and a field decoder.
    #[must_use]
    pub fn new(config: Arc<ProtocolConfig>, decoder: Arc<dyn FieldDecoder>) -> Self {
        Self {
            decoder,
            validator: RecordValidator::new(Arc::clone(&config)),
            payout: PayoutVerifier::new(config),
        }
    }

    /// The validator used for structural checks.
    #[must_use]
    pub fn validator(&self) -> &RecordValidator {
        &self.validator
    }

    /// Decodes `script` and projects it into a record without the freshness
    /// rule.
    ///
    /// # Errors
    ///
    /// Returns a [`RejectReason`] if the script does not decode or the
    /// fields are structurally invalid.
    pub fn project(&self, script: &[u8]) -> Result<Option<Record>, RejectReason> {
        let fields = self.decoder.decode(script)?;
        self.validator.project(&fields)
    }

    /// Full admission check of the output at `index`.
    ///
    /// # Errors
    ///
    /// Returns the [`RejectReason`] the output fails on.
    pub fn evaluate_output(
        &self,
        outputs: &[TransactionOutput],
        index: usize,
        now_ms: i64,
    ) -> Result<Option<Record>, RejectReason> {
        let Some(output) = outputs.get(index) else {
            return Ok(None);
        };
        let fields = self.decoder.decode(&output.locking_script)?;
        let record = self.validator.validate(&fields, now_ms)?;
        if let Some(Record::Reaction(reaction)) = &record {
            self.payout.verify(reaction, outputs, index)?;
        }
        Ok(record)
    }

    /// Admissible outputs with their records, ascending by output index.
    #[must_use]
    pub fn admissible_records(
        &self,
        outputs: &[TransactionOutput],
        now_ms: i64,
    ) -> Vec<(u32, Record)> {
        let mut admitted = Vec::new();

        for index in 0..outputs.len() {
            let Ok(output_index) = u32::try_from(index) else {
                break;
            };
            match self.evaluate_output(outputs, index, now_ms) {
                Ok(Some(record)) => {
                    tracing::debug!(output_index, kind = %record.kind(), "output admissible");
                    admitted.push((output_index, record));
                }
                Ok(None) => {
                    tracing::trace!(output_index, "output belongs to another protocol");
                }
                Err(reason) => {
                    tracing::debug!(output_index, %reason, "output rejected");
                }
            }
        }

        admitted
    }

    /// Returns the indices of the outputs that pass every admission rule at
    /// time `now_ms`.
    #[must_use]
    pub fn identify_admissible_outputs(
        &self,
        outputs: &[TransactionOutput],
        now_ms: i64,
    ) -> AdmittanceInstructions {
        AdmittanceInstructions {
            outputs_to_admit: self
                .admissible_records(outputs, now_ms)
                .into_iter()
                .map(|(index, _)| index)
                .collect(),
            coins_to_retain: Vec::new(),
        }
    }
}
