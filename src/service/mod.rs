//! Service layer: indexing, lookups, and the overlay facade.
//!
//! [`OverlayService`] runs admission through [`crate::admission`], writes
//! admitted records with [`RecordIndexer`], and answers lookups with
//! [`QueryEngine`].

pub mod indexer;
pub mod overlay_service;
pub mod query_engine;

pub use indexer::RecordIndexer;
pub use overlay_service::{
    OverlayDocumentation, OverlayMetadata, OverlayService, ServiceMetadata,
};
pub use query_engine::{LookupQuery, QueryEngine};
