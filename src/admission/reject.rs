//! Diagnostic reasons an output is not admitted.

use crate::codec::CodecError;
use crate::domain::RecordKind;
use crate::keys::KeyError;

/// Why an output was rejected.
///
/// Internal only: callers of admission see nothing but the absence of the
/// output index from the admit list.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RejectReason {
    /// Locking script did not decode into fields.
    #[error("undecodable output: {0}")]
    Decode(#[from] CodecError),

    /// Decoded field list is empty.
    #[error("output carries no fields")]
    NoFields,

    /// A text field is not valid UTF-8.
    #[error("field {field} is not valid UTF-8")]
    InvalidUtf8 {
        /// Field name.
        field: &'static str,
    },

    /// Wrong number of fields for the record kind.
    #[error("{kind} expects {expected} fields, got {actual}")]
    FieldCount {
        /// Record kind named by the tag.
        kind: RecordKind,
        /// Required field count.
        expected: usize,
        /// Decoded field count.
        actual: usize,
    },

    /// A required field is empty.
    #[error("{kind} field {field} is empty")]
    EmptyField {
        /// Record kind.
        kind: RecordKind,
        /// Field name.
        field: &'static str,
    },

    /// `createdAt` is not a decimal millisecond timestamp.
    #[error("unparseable createdAt: {0:?}")]
    InvalidTimestamp(String),

    /// `createdAt` lies after admission time.
    #[error("createdAt {created_at} is in the future (now {now})")]
    FutureTimestamp {
        /// Encoded creation time.
        created_at: i64,
        /// Admission time.
        now: i64,
    },

    /// `createdAt` lies before the freshness window.
    #[error("createdAt {created_at} is older than the freshness window (now {now})")]
    StaleTimestamp {
        /// Encoded creation time.
        created_at: i64,
        /// Admission time.
        now: i64,
    },

    /// An identity key field is not a public key.
    #[error("field {field} is not a valid public key")]
    InvalidIdentityKey {
        /// Field name.
        field: &'static str,
    },

    /// Topic title is not slug-safe.
    #[error("topic title {0:?} is not [A-Za-z0-9_-]+")]
    TitleNotSlug(String),

    /// Derivation prefix or suffix is empty.
    #[error("reaction derivation prefix or suffix is empty")]
    EmptyDerivationField,

    /// Emoji has no positive configured price.
    #[error("no price configured for emoji {0:?}")]
    UnpricedEmoji(String),

    /// Payout key derivation failed.
    #[error("payout derivation failed: {0}")]
    PayoutDerivation(#[from] KeyError),

    /// No sibling output pays the derived script enough.
    #[error("no sibling output pays at least {required} sats to the payout script")]
    MissingPayout {
        /// Required price in satoshis.
        required: u64,
    },
}
