//! Transaction outputs as handed over by the transaction decoder.

/// One output of a transaction under admission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionOutput {
    /// Value in satoshis.
    pub satoshis: u64,
    /// Raw locking script.
    pub locking_script: Vec<u8>,
}

impl TransactionOutput {
    /// Creates an output.
    #[must_use]
    pub fn new(satoshis: u64, locking_script: Vec<u8>) -> Self {
        Self {
            satoshis,
            locking_script,
        }
    }
}
