//! API request and response DTOs

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::sync::SyncResource;

const DEFAULT_PAGE_LIMIT: i64 = 10;
const MAX_PAGE_LIMIT: i64 = 100;

/// `?limit=&offset=` query parameters
#[derive(Debug, Default, Deserialize)]
pub struct PaginationParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl PaginationParams {
    /// Resolve to `(limit, offset)`
    ///
    /// Limit defaults to 10 and is capped at 100.
    pub fn resolve(&self) -> Result<(i64, i64), AppError> {
        let limit = self.limit.unwrap_or(DEFAULT_PAGE_LIMIT);
        if limit < 1 {
            return Err(AppError::Validation("limit must be at least 1".to_string()));
        }

        let offset = self.offset.unwrap_or(0);
        if offset < 0 {
            return Err(AppError::Validation("offset must not be negative".to_string()));
        }

        Ok((limit.min(MAX_PAGE_LIMIT), offset))
    }
}

/// Query parameters of `GET /api/v1/rocket-launches`
#[derive(Debug, Default, Deserialize)]
pub struct RocketLaunchListParams {
    pub status: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl RocketLaunchListParams {
    pub fn pagination(&self) -> PaginationParams {
        PaginationParams {
            limit: self.limit,
            offset: self.offset,
        }
    }
}

/// Query parameters of `POST /api/v1/sync/{resource}`
#[derive(Debug, Default, Deserialize)]
pub struct SyncTriggerParams {
    /// Run inline and answer with the report
    #[serde(default)]
    pub wait: bool,
}

/// Answer to a fire-and-forget trigger
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncStartedResponse {
    pub status: String,
    pub resource: SyncResource,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncStatusResponse {
    pub resource: SyncResource,
    pub running: bool,
}
