//! Sync trigger endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};

use super::dto::{SyncStartedResponse, SyncStatusResponse, SyncTriggerParams};
use crate::AppState;
use crate::error::AppError;
use crate::metrics::{HTTP_REQUEST_DURATION_SECONDS, HTTP_REQUESTS_TOTAL};
use crate::sync::SyncResource;

/// POST /api/v1/sync/:resource
///
/// Starts a run in the background and answers 202. With `?wait=true` the
/// report is returned once the run ends; a client that hangs up early does
/// not cancel the run.
pub async fn trigger_sync(
    State(state): State<AppState>,
    Path(resource): Path<String>,
    Query(params): Query<SyncTriggerParams>,
) -> Result<Response, AppError> {
    let _timer = HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&["POST", "/api/v1/sync/:resource"])
        .start_timer();

    let resource: SyncResource = resource.parse()?;

    let response = if params.wait {
        let report = state.sync.run(resource).await?;
        (StatusCode::OK, Json(report)).into_response()
    } else {
        // Detached; the task logs its own failure
        let handle = state.sync.spawn(resource)?;
        tracing::info!(resource = %handle.resource(), "Sync triggered");
        (
            StatusCode::ACCEPTED,
            Json(SyncStartedResponse {
                status: "started".to_string(),
                resource,
            }),
        )
            .into_response()
    };

    HTTP_REQUESTS_TOTAL
        .with_label_values(&[
            "POST",
            "/api/v1/sync/:resource",
            response.status().as_str(),
        ])
        .inc();

    Ok(response)
}

/// GET /api/v1/sync/:resource
pub async fn sync_status(
    State(state): State<AppState>,
    Path(resource): Path<String>,
) -> Result<Json<SyncStatusResponse>, AppError> {
    let resource: SyncResource = resource.parse()?;

    Ok(Json(SyncStatusResponse {
        resource,
        running: state.sync.is_running(resource),
    }))
}

/// GET /api/v1/sync
pub async fn list_sync_status(State(state): State<AppState>) -> Json<Vec<SyncStatusResponse>> {
    Json(
        SyncResource::ALL
            .into_iter()
            .map(|resource| SyncStatusResponse {
                resource,
                running: state.sync.is_running(resource),
            })
            .collect(),
    )
}
