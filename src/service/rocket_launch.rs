//! Rocket launch service
//!
//! Reads reconciled launches through the read cache.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::data::{Database, ReadCache, RocketLaunch};
use crate::error::AppError;
use crate::sync::SyncResource;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RocketLaunchPage {
    pub count: i64,
    pub results: Vec<RocketLaunch>,
}

pub struct RocketLaunchService {
    db: Arc<Database>,
    cache: Arc<ReadCache>,
}

impl RocketLaunchService {
    pub fn new(db: Arc<Database>, cache: Arc<ReadCache>) -> Self {
        Self { db, cache }
    }

    fn namespace() -> &'static str {
        SyncResource::RocketLaunches.collection()
    }

    /// List launches, latest known time first
    ///
    /// # Arguments
    /// * `status` - Only launches with this status, all when `None`
    pub async fn list(
        &self,
        status: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<RocketLaunchPage, AppError> {
        let key = format!(
            "{}:list:{}:{limit}:{offset}",
            Self::namespace(),
            status.unwrap_or("*")
        );

        self.cache
            .get_or_load(key, move || async move {
                let count = self.db.count_rocket_launches(status).await?;
                let results = self.db.list_rocket_launches(status, limit, offset).await?;
                Ok(RocketLaunchPage { count, results })
            })
            .await
    }

    /// Get a launch with its missions by local id
    pub async fn get(&self, id: i64) -> Result<RocketLaunch, AppError> {
        let key = format!("{}:item:{id}", Self::namespace());

        self.cache
            .get_or_load(key, move || async move {
                self.db
                    .get_rocket_launch(id)
                    .await?
                    .ok_or(AppError::NotFound)
            })
            .await
    }
}
