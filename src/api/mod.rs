//! REST API layer: route handlers, DTOs, and router composition.
//!
//! Overlay endpoints are mounted under `/api/v1`; health and configuration
//! endpoints at the root. With the `swagger-ui` feature the OpenAPI document
//! is served at `/api-docs/openapi.json` and browsable at `/swagger-ui`.

pub mod dto;
pub mod handlers;

use axum::Router;
use utoipa::OpenApi;

use crate::app_state::AppState;

/// OpenAPI document for every endpoint.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "forum-overlay",
        description = "Admission, indexing and lookup for on-chain forum records."
    ),
    paths(
        handlers::admission::identify_admissible_outputs,
        handlers::admission::submit_transaction,
        handlers::outputs::output_admitted,
        handlers::outputs::output_spent,
        handlers::outputs::output_evicted,
        handlers::lookup::lookup,
        handlers::lookup::metadata,
        handlers::lookup::documentation,
        handlers::system::health_handler,
        handlers::system::emoji_prices_handler,
    ),
    tags(
        (name = "Admission", description = "Admission decisions and transaction submission"),
        (name = "Outputs", description = "Output lifecycle notifications"),
        (name = "Lookup", description = "Queries over indexed records"),
        (name = "System", description = "Health and configuration"),
    )
)]
pub struct ApiDoc;

/// Builds the complete API router with all REST endpoints.
pub fn build_router() -> Router<AppState> {
    let router = Router::new()
        .nest("/api/v1", handlers::routes())
        .merge(handlers::system::routes());

    #[cfg(feature = "swagger-ui")]
    let router = router.merge(
        utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
            .url("/api-docs/openapi.json", ApiDoc::openapi()),
    );

    router
}
