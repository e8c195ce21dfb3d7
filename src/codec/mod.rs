//! Tagged-field codec seam.
//!
//! A locking script carries an ordered list of byte-array fields, field 0
//! being the UTF-8 type tag. [`FieldDecoder`] is the port the admission and
//! indexing paths decode through; [`PushDropDecoder`] is the adapter for the
//! push-drop script template.

pub mod push_drop;

pub use push_drop::{PushDropDecoder, encode_push_drop};

/// Why a locking script could not be decoded into fields.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    /// Script ended in the middle of a push.
    #[error("truncated push at byte {0}")]
    TruncatedPush(usize),

    /// Script does not start with `<pubkey> OP_CHECKSIG`.
    #[error("missing push-drop lock prefix")]
    MissingLock,

    /// A non-push opcode appeared among the fields.
    #[error("unexpected opcode 0x{0:02x} in field section")]
    UnexpectedOpcode(u8),

    /// Field section is not followed by OP_DROP / OP_2DROP.
    #[error("field section not terminated by a drop")]
    MissingDrop,

    /// Data pushed after the drops.
    #[error("data pushed after the drop section")]
    TrailingData,

    /// Lock prefix present but no fields follow.
    #[error("script carries no fields")]
    NoFields,
}

/// Decodes a locking script into its ordered fields.
pub trait FieldDecoder: Send + Sync + std::fmt::Debug {
    /// Returns the fields of `script`, field 0 first.
    ///
    /// # Errors
    ///
    /// Returns a [`CodecError`] if the script does not follow the template.
    fn decode(&self, script: &[u8]) -> Result<Vec<Vec<u8>>, CodecError>;
}
