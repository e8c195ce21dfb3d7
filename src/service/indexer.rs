//! Record indexer: materializes admitted records and removes spent ones.

use std::sync::Arc;

use crate::domain::{IndexedRecord, Outpoint, Record};
use crate::error::OverlayError;
use crate::storage::{Collection, RecordStore};

/// Writes to the record store on behalf of admission and spend events.
#[derive(Debug, Clone)]
pub struct RecordIndexer {
    store: Arc<dyn RecordStore>,
}

impl RecordIndexer {
    /// Creates an indexer over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Appends `record` under `outpoint` to the collection for its kind.
    ///
    /// # Errors
    ///
    /// Returns [`OverlayError::DuplicateOutpoint`] if the outpoint is already
    /// indexed, or [`OverlayError::PersistenceError`] if the store fails. The
    /// output must then be treated as not durably admitted.
    pub async fn insert(&self, outpoint: Outpoint, record: Record) -> Result<(), OverlayError> {
        let indexed = IndexedRecord::new(outpoint, record);
        self.store.insert(&indexed).await?;
        tracing::info!(
            txid = %indexed.outpoint.txid,
            output_index = indexed.outpoint.output_index,
            kind = %indexed.record.kind(),
            created_by = indexed.record.created_by(),
            "record indexed"
        );
        Ok(())
    }

    /// Removes `outpoint` from every collection and returns how many records
    /// were removed.
    ///
    /// Never fails: a collection that errors is logged and skipped. An
    /// outpoint that was never indexed removes nothing.
    pub async fn delete(&self, outpoint: &Outpoint) -> u64 {
        let mut removed = 0_u64;
        for collection in Collection::ALL {
            match self.store.delete(collection, outpoint).await {
                Ok(count) => removed = removed.saturating_add(count),
                Err(error) => {
                    tracing::warn!(
                        %outpoint,
                        %collection,
                        %error,
                        "failed to delete record from collection"
                    );
                }
            }
        }
        if removed > 0 {
            tracing::info!(%outpoint, removed, "record removed");
        }
        removed
    }
}
