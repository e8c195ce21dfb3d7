//! REST endpoint handlers organized by resource.

pub mod admission;
pub mod lookup;
pub mod outputs;
pub mod system;

use axum::Router;

use crate::app_state::AppState;

/// Composes all resource routes under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(admission::routes())
        .merge(outputs::routes())
        .merge(lookup::routes())
}
