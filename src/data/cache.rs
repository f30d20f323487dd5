//! In-memory read cache
//!
//! Volatile and cleared on restart. Uses Moka for concurrent caching.
//! Keys are namespaced as `{namespace}:...` so a finished sync can drop
//! every cached read of the resource it touched.

use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;

use crate::error::AppError;

/// Cache namespace eviction used by sync runs
#[cfg_attr(test, mockall::automock)]
pub trait CacheInvalidator: Send + Sync {
    /// Drop every entry whose key starts with `{namespace}:`
    fn invalidate_namespace(&self, namespace: &str);
}

/// JSON read cache for list and detail responses
pub struct ReadCache {
    entries: Cache<String, Arc<serde_json::Value>>,
}

impl ReadCache {
    /// Create new read cache
    ///
    /// # Arguments
    /// * `max_items` - Maximum number of cached responses
    /// * `ttl` - Time to live of each entry
    pub fn new(max_items: u64, ttl: Duration) -> Self {
        let entries = Cache::builder()
            .max_capacity(max_items)
            .time_to_live(ttl)
            .support_invalidation_closures()
            .build();

        Self { entries }
    }

    pub async fn get(&self, key: &str) -> Option<Arc<serde_json::Value>> {
        let result = self.entries.get(key).await;

        use crate::metrics::{CACHE_HITS_TOTAL, CACHE_MISSES_TOTAL};
        if result.is_some() {
            CACHE_HITS_TOTAL.with_label_values(&["read"]).inc();
        } else {
            CACHE_MISSES_TOTAL.with_label_values(&["read"]).inc();
        }

        result
    }

    pub async fn insert(&self, key: String, value: serde_json::Value) {
        self.entries.insert(key, Arc::new(value)).await;

        use crate::metrics::CACHE_SIZE;
        CACHE_SIZE
            .with_label_values(&["read"])
            .set(self.entries.entry_count() as i64);
    }

    /// Typed lookup, falling back to `load` and caching its result
    pub async fn get_or_load<T, F, Fut>(&self, key: String, load: F) -> Result<T, AppError>
    where
        T: serde::Serialize + serde::de::DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<T, AppError>>,
    {
        if let Some(cached) = self.get(&key).await {
            match serde_json::from_value::<T>(cached.as_ref().clone()) {
                Ok(value) => return Ok(value),
                Err(error) => {
                    tracing::warn!(%key, %error, "Discarding undecodable cache entry");
                    self.entries.invalidate(&key).await;
                }
            }
        }

        let value = load().await?;
        let json = serde_json::to_value(&value)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("cache encode failed: {e}")))?;
        self.insert(key, json).await;

        Ok(value)
    }

    /// Invalidate all keys starting with `prefix`
    pub fn invalidate_prefix(&self, prefix: &str) {
        let prefix = prefix.to_string();
        if let Err(error) = self
            .entries
            .invalidate_entries_if(move |key, _| key.starts_with(&prefix))
        {
            tracing::warn!(%error, "Cache prefix invalidation rejected, clearing cache");
            self.entries.invalidate_all();
        }
    }
}

impl CacheInvalidator for ReadCache {
    fn invalidate_namespace(&self, namespace: &str) {
        self.invalidate_prefix(&format!("{namespace}:"));
        tracing::debug!(namespace, "Read cache namespace invalidated");
    }
}
