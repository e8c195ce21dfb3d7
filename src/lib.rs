//! # forum-overlay
//!
//! Overlay service for an on-chain discussion forum. Topics, posts, replies
//! and paid emoji reactions are encoded as tagged fields in transaction
//! outputs; this crate decides which outputs to admit, indexes the admitted
//! records, and answers lookups over them.
//!
//! ## Architecture
//!
//! ```text
//! Overlay host (HTTP)
//!     │
//!     ├── REST Handlers (api/)
//!     │
//!     ├── OverlayService (service/)
//!     │     ├── AdmissionDecider (admission/)
//!     │     │     ├── FieldDecoder (codec/)
//!     │     │     ├── RecordValidator
//!     │     │     └── PayoutVerifier (keys/)
//!     │     ├── RecordIndexer
//!     │     └── QueryEngine
//!     │
//!     └── RecordStore (storage/): memory or PostgreSQL
//! ```

pub mod admission;
pub mod api;
pub mod app_state;
pub mod codec;
pub mod config;
pub mod domain;
pub mod error;
pub mod keys;
pub mod service;
pub mod storage;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::http::StatusCode;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::app_state::AppState;

/// Full HTTP application: API routes with request tracing, a per-request
/// timeout and permissive CORS.
pub fn build_app(state: AppState, request_timeout: Duration) -> Router {
    Router::new()
        .merge(api::build_router())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::with_status_code(
                    StatusCode::REQUEST_TIMEOUT,
                    request_timeout,
                ))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

/// Overlay service over an in-memory store and the push-drop decoder.
#[must_use]
pub fn in_memory_service(config: config::ProtocolConfig) -> service::OverlayService {
    service::OverlayService::new(
        Arc::new(config),
        Arc::new(codec::PushDropDecoder::new()),
        Arc::new(storage::MemoryRecordStore::new()),
    )
}
