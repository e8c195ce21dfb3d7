//! In-memory record store.

use tokio::sync::RwLock;

use super::{Collection, RecordFilter, RecordStore};
use crate::domain::{IndexedRecord, Outpoint};
use crate::error::OverlayError;

/// Record store keeping each collection in a `Vec`, in admission order.
///
/// Each collection has its own lock, so a write to one never blocks reads
/// of another.
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    topics: RwLock<Vec<IndexedRecord>>,
    posts: RwLock<Vec<IndexedRecord>>,
    replies: RwLock<Vec<IndexedRecord>>,
    reactions: RwLock<Vec<IndexedRecord>>,
}

impl MemoryRecordStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn collection(&self, collection: Collection) -> &RwLock<Vec<IndexedRecord>> {
        match collection {
            Collection::Topics => &self.topics,
            Collection::Posts => &self.posts,
            Collection::Replies => &self.replies,
            Collection::Reactions => &self.reactions,
        }
    }

    /// Total number of records across collections.
    pub async fn len(&self) -> usize {
        let mut total = 0;
        for collection in Collection::ALL {
            total += self.collection(collection).read().await.len();
        }
        total
    }

    /// Returns `true` if no collection holds a record.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait::async_trait]
impl RecordStore for MemoryRecordStore {
    async fn insert(&self, record: &IndexedRecord) -> Result<(), OverlayError> {
        // Locks are taken in `Collection::ALL` order.
        let mut topics = self.topics.write().await;
        let mut posts = self.posts.write().await;
        let mut replies = self.replies.write().await;
        let mut reactions = self.reactions.write().await;

        let taken = [&*topics, &*posts, &*replies, &*reactions]
            .into_iter()
            .flatten()
            .any(|r| r.outpoint == record.outpoint);
        if taken {
            return Err(OverlayError::DuplicateOutpoint(record.outpoint.clone()));
        }

        let records = match Collection::for_kind(record.record.kind()) {
            Collection::Topics => &mut *topics,
            Collection::Posts => &mut *posts,
            Collection::Replies => &mut *replies,
            Collection::Reactions => &mut *reactions,
        };
        records.push(record.clone());
        Ok(())
    }

    async fn delete(
        &self,
        collection: Collection,
        outpoint: &Outpoint,
    ) -> Result<u64, OverlayError> {
        let mut records = self.collection(collection).write().await;
        let before = records.len();
        records.retain(|r| r.outpoint != *outpoint);
        Ok(u64::try_from(before - records.len()).unwrap_or(u64::MAX))
    }

    async fn find(
        &self,
        collection: Collection,
        filter: &RecordFilter,
    ) -> Result<Vec<Outpoint>, OverlayError> {
        if !filter.applies_to(collection) {
            return Err(filter.unsupported(collection));
        }
        let records = self.collection(collection).read().await;
        Ok(records
            .iter()
            .filter(|r| filter.matches(r))
            .map(|r| r.outpoint.clone())
            .collect())
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::{Post, Record, Topic};

    fn topic(txid: &str, title: &str) -> IndexedRecord {
        IndexedRecord::new(
            Outpoint::new(txid, 0),
            Record::Topic(Topic {
                title: title.to_string(),
                description: "d".to_string(),
                created_at: 1,
                created_by: "02ab".to_string(),
            }),
        )
    }

    #[tokio::test]
    async fn insert_and_find_in_admission_order() {
        let store = MemoryRecordStore::new();
        for (txid, title) in [("b", "cats"), ("a", "dogs"), ("c", "cats")] {
            let Ok(()) = store.insert(&topic(txid, title)).await else {
                panic!("insert failed");
            };
        }
        let Ok(found) = store
            .find(Collection::Topics, &RecordFilter::TopicTitle("cats".to_string()))
            .await
        else {
            panic!("find failed");
        };
        assert_eq!(found, vec![Outpoint::new("b", 0), Outpoint::new("c", 0)]);
        assert_eq!(store.len().await, 3);
    }

    #[tokio::test]
    async fn duplicate_insert_is_an_error() {
        let store = MemoryRecordStore::new();
        let record = topic("a", "cats");
        assert!(store.insert(&record).await.is_ok());
        let Err(OverlayError::DuplicateOutpoint(outpoint)) = store.insert(&record).await else {
            panic!("duplicate should be rejected");
        };
        assert_eq!(outpoint, Outpoint::new("a", 0));
    }

    #[tokio::test]
    async fn outpoint_is_unique_across_collections() {
        let store = MemoryRecordStore::new();
        assert!(store.insert(&topic("x", "cats")).await.is_ok());
        let post = IndexedRecord::new(
            Outpoint::new("x", 0),
            Record::Post(Post {
                topic_txid: "t".to_string(),
                title: "hello".to_string(),
                media_url: None,
                body: "b".to_string(),
                created_at: 1,
                created_by: "02ab".to_string(),
                tags: Vec::new(),
                pre_edit_txid: None,
            }),
        );
        assert!(matches!(
            store.insert(&post).await,
            Err(OverlayError::DuplicateOutpoint(_))
        ));
        assert_eq!(store.len().await, 1);
        let Ok(posts) = store.find(Collection::Posts, &RecordFilter::All).await else {
            panic!("find failed");
        };
        assert!(posts.is_empty());
    }

    #[tokio::test]
    async fn delete_missing_is_noop() {
        let store = MemoryRecordStore::new();
        let removed = store.delete(Collection::Posts, &Outpoint::new("zz", 3)).await;
        assert!(matches!(removed, Ok(0)));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn delete_removes_exact_outpoint() {
        let store = MemoryRecordStore::new();
        assert!(store.insert(&topic("a", "cats")).await.is_ok());
        assert!(matches!(
            store.delete(Collection::Topics, &Outpoint::new("a", 1)).await,
            Ok(0)
        ));
        assert!(matches!(
            store.delete(Collection::Topics, &Outpoint::new("a", 0)).await,
            Ok(1)
        ));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn inapplicable_filter_is_an_error() {
        let store = MemoryRecordStore::new();
        let result = store
            .find(Collection::Replies, &RecordFilter::RecipientKey("k".to_string()))
            .await;
        assert!(matches!(result, Err(OverlayError::PersistenceError(_))));
    }
}
