//! API layer
//!
//! HTTP handlers for:
//! - Sync triggers and run status
//! - Synced Launch Library 2 collections
//! - Reconciled rocket launches
//! - Metrics (Prometheus)

mod catalog;
mod dto;
pub mod metrics;
mod rocket_launches;
mod sync;

use axum::{
    Router,
    routing::get,
};

use crate::AppState;

pub use dto::*;
pub use metrics::metrics_router;

/// Create the `/api` router
pub fn api_router() -> Router<AppState> {
    Router::new()
        .route("/v1/sync", get(sync::list_sync_status))
        .route(
            "/v1/sync/:resource",
            get(sync::sync_status).post(sync::trigger_sync),
        )
        .route("/v1/ll2/:resource", get(catalog::list_documents))
        .route(
            "/v1/ll2/:resource/:external_id",
            get(catalog::get_document),
        )
        .route(
            "/v1/rocket-launches",
            get(rocket_launches::list_rocket_launches),
        )
        .route(
            "/v1/rocket-launches/:id",
            get(rocket_launches::get_rocket_launch),
        )
}
