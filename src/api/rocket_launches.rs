//! Reconciled rocket launches

use axum::{
    extract::{Path, Query, State},
    response::Json,
};

use super::dto::RocketLaunchListParams;
use crate::AppState;
use crate::data::RocketLaunch;
use crate::error::AppError;
use crate::metrics::{HTTP_REQUEST_DURATION_SECONDS, HTTP_REQUESTS_TOTAL};
use crate::service::{RocketLaunchPage, RocketLaunchService};

/// GET /api/v1/rocket-launches
pub async fn list_rocket_launches(
    State(state): State<AppState>,
    Query(params): Query<RocketLaunchListParams>,
) -> Result<Json<RocketLaunchPage>, AppError> {
    let _timer = HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&["GET", "/api/v1/rocket-launches"])
        .start_timer();

    let (limit, offset) = params.pagination().resolve()?;
    let status = params
        .status
        .as_deref()
        .map(str::trim)
        .filter(|status| !status.is_empty());

    let page = RocketLaunchService::new(state.db.clone(), state.cache.clone())
        .list(status, limit, offset)
        .await?;

    HTTP_REQUESTS_TOTAL
        .with_label_values(&["GET", "/api/v1/rocket-launches", "200"])
        .inc();

    Ok(Json(page))
}

/// GET /api/v1/rocket-launches/:id
pub async fn get_rocket_launch(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<RocketLaunch>, AppError> {
    let launch = RocketLaunchService::new(state.db.clone(), state.cache.clone())
        .get(id)
        .await?;

    Ok(Json(launch))
}
