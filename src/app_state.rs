//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::service::OverlayService;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Overlay service for admission, indexing and lookups.
    pub overlay_service: Arc<OverlayService>,
}

impl AppState {
    /// Wraps a service.
    #[must_use]
    pub fn new(overlay_service: OverlayService) -> Self {
        Self {
            overlay_service: Arc::new(overlay_service),
        }
    }
}
