//! Storage layer: typed record collections behind the [`RecordStore`] port.
//!
//! Two adapters implement the port:
//!
//! - [`MemoryRecordStore`]: per-collection `RwLock<Vec<_>>`, the default.
//! - [`PostgresRecordStore`]: one table per collection via `sqlx::PgPool`.
//!
//! Collections are the closed set of [`Collection`] variants. Callers that
//! only know an outpoint iterate [`Collection::ALL`].

pub mod memory;
pub mod postgres;

use std::fmt;

pub use memory::MemoryRecordStore;
pub use postgres::PostgresRecordStore;

use crate::domain::{IndexedRecord, Outpoint, Record, RecordKind};
use crate::error::OverlayError;

/// One typed collection of indexed records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    /// Topic records.
    Topics,
    /// Post records.
    Posts,
    /// Reply records.
    Replies,
    /// Reaction records.
    Reactions,
}

impl Collection {
    /// Every collection, in deletion order.
    pub const ALL: [Self; 4] = [Self::Topics, Self::Posts, Self::Replies, Self::Reactions];

    /// Collection holding records of `kind`.
    #[must_use]
    pub const fn for_kind(kind: RecordKind) -> Self {
        match kind {
            RecordKind::Topic => Self::Topics,
            RecordKind::Post => Self::Posts,
            RecordKind::Reply => Self::Replies,
            RecordKind::Reaction => Self::Reactions,
        }
    }

    /// Stable name used in logs and table names.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Topics => "topics",
            Self::Posts => "posts",
            Self::Replies => "replies",
            Self::Reactions => "reactions",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Selection applied to a single collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordFilter {
    /// Every record.
    All,
    /// The record at this exact outpoint.
    Outpoint(Outpoint),
    /// Records whose own outpoint has this txid.
    OwnTxid(String),
    /// Topics with this exact title.
    TopicTitle(String),
    /// Posts and reactions under this topic txid.
    TopicTxid(String),
    /// Replies and reactions under this post txid.
    ParentPostTxid(String),
    /// Reactions paying this identity key.
    RecipientKey(String),
}

impl RecordFilter {
    /// Whether `collection` has a column this filter can match on.
    #[must_use]
    pub const fn applies_to(&self, collection: Collection) -> bool {
        match self {
            Self::All | Self::Outpoint(_) | Self::OwnTxid(_) => true,
            Self::TopicTitle(_) => matches!(collection, Collection::Topics),
            Self::TopicTxid(_) => matches!(collection, Collection::Posts | Collection::Reactions),
            Self::ParentPostTxid(_) => {
                matches!(collection, Collection::Replies | Collection::Reactions)
            }
            Self::RecipientKey(_) => matches!(collection, Collection::Reactions),
        }
    }

    /// Evaluates the filter against an indexed record.
    #[must_use]
    pub fn matches(&self, indexed: &IndexedRecord) -> bool {
        match (self, &indexed.record) {
            (Self::All, _) => true,
            (Self::Outpoint(outpoint), _) => indexed.outpoint == *outpoint,
            (Self::OwnTxid(txid), _) => indexed.outpoint.txid == *txid,
            (Self::TopicTitle(title), Record::Topic(topic)) => topic.title == *title,
            (Self::TopicTxid(txid), Record::Post(post)) => post.topic_txid == *txid,
            (Self::TopicTxid(txid), Record::Reaction(reaction)) => reaction.topic_txid == *txid,
            (Self::ParentPostTxid(txid), Record::Reply(reply)) => reply.post_txid == *txid,
            (Self::ParentPostTxid(txid), Record::Reaction(reaction)) => {
                reaction.parent_post_txid == *txid
            }
            (Self::RecipientKey(key), Record::Reaction(reaction)) => reaction.recipient_key == *key,
            _ => false,
        }
    }

    pub(crate) fn unsupported(&self, collection: Collection) -> OverlayError {
        OverlayError::PersistenceError(format!(
            "filter {self:?} is not supported on collection {collection}"
        ))
    }
}

/// Port for the indexed record collections.
///
/// Implementations must be safe under concurrent calls. Results of
/// [`RecordStore::find`] are in admission order.
#[async_trait::async_trait]
pub trait RecordStore: Send + Sync + fmt::Debug {
    /// Appends a record to the collection for its kind.
    ///
    /// # Errors
    ///
    /// Returns [`OverlayError::DuplicateOutpoint`] if the collection already
    /// holds the outpoint, or [`OverlayError::PersistenceError`] on backend
    /// failure.
    async fn insert(&self, record: &IndexedRecord) -> Result<(), OverlayError>;

    /// Removes the record at `outpoint` from one collection. Returns how many
    /// records were removed; zero when absent.
    ///
    /// # Errors
    ///
    /// Returns [`OverlayError::PersistenceError`] on backend failure.
    async fn delete(
        &self,
        collection: Collection,
        outpoint: &Outpoint,
    ) -> Result<u64, OverlayError>;

    /// Outpoints of the records in `collection` matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns [`OverlayError::PersistenceError`] if the filter does not apply
    /// to the collection or on backend failure.
    async fn find(
        &self,
        collection: Collection,
        filter: &RecordFilter,
    ) -> Result<Vec<Outpoint>, OverlayError>;
}
