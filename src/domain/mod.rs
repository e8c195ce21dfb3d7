//! Domain layer: outpoints, transaction outputs, typed records, and the
//! emoji price table.
//!
//! Everything here is plain data. Admission policy lives in
//! [`crate::admission`], storage in [`crate::storage`].

pub mod emoji;
pub mod outpoint;
pub mod output;
pub mod record;

pub use emoji::{EmojiPriceTable, default_price_table, normalize_emoji};
pub use outpoint::Outpoint;
pub use output::TransactionOutput;
pub use record::{IndexedRecord, Post, Reaction, Record, RecordKind, Reply, Topic, TypeTag};
