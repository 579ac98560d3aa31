//! Mock e-signature service
//!
//! Serves the same routes and envelopes as the hosted signing service,
//! backed by an in-memory registry. Requests advance through the lifecycle
//! as they are viewed and downloaded:
//! - `GET /api/firma/:id` moves `created` to `started`
//! - `GET /api/firma/:id/download` moves any request to `finished`

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod error;
pub mod handlers;
pub mod models;
pub mod state;

pub use error::MockError;
pub use state::AppState;

/// Route prefix shared with the hosted service
pub const API_PREFIX: &str = "/api/firma";

/// Router over a fresh registry
pub fn app() -> Router {
    router(Arc::new(AppState::new()))
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        .route(
            "/",
            get(handlers::list_requests).post(handlers::create_request),
        )
        .route("/health", get(handlers::health))
        .route("/:id", get(handlers::get_request))
        .route("/:id/download", get(handlers::download_document))
        .route("/:id/audit", get(handlers::audit_trail));

    Router::new()
        .nest(API_PREFIX, api)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
