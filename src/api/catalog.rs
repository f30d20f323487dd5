//! Synced Launch Library 2 collections

use axum::{
    extract::{Path, Query, State},
    response::Json,
};

use super::dto::PaginationParams;
use crate::AppState;
use crate::error::AppError;
use crate::metrics::{HTTP_REQUEST_DURATION_SECONDS, HTTP_REQUESTS_TOTAL};
use crate::service::{CatalogPage, CatalogService};
use crate::sync::SyncResource;

fn catalog_service(state: &AppState) -> CatalogService {
    CatalogService::new(state.db.clone(), state.cache.clone())
}

/// GET /api/v1/ll2/:resource
pub async fn list_documents(
    State(state): State<AppState>,
    Path(resource): Path<String>,
    Query(params): Query<PaginationParams>,
) -> Result<Json<CatalogPage>, AppError> {
    let _timer = HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&["GET", "/api/v1/ll2/:resource"])
        .start_timer();

    let resource: SyncResource = resource.parse()?;
    let (limit, offset) = params.resolve()?;
    let page = catalog_service(&state)
        .list(resource, limit, offset)
        .await?;

    HTTP_REQUESTS_TOTAL
        .with_label_values(&["GET", "/api/v1/ll2/:resource", "200"])
        .inc();

    Ok(Json(page))
}

/// GET /api/v1/ll2/:resource/:external_id
pub async fn get_document(
    State(state): State<AppState>,
    Path((resource, external_id)): Path<(String, String)>,
) -> Result<Json<serde_json::Value>, AppError> {
    let _timer = HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&["GET", "/api/v1/ll2/:resource/:id"])
        .start_timer();

    let resource: SyncResource = resource.parse()?;
    let document = catalog_service(&state).get(resource, &external_id).await?;

    HTTP_REQUESTS_TOTAL
        .with_label_values(&["GET", "/api/v1/ll2/:resource/:id", "200"])
        .inc();

    Ok(Json(document))
}
