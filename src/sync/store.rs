//! Keyed merge-write of upstream records
//!
//! Each record is its own commit point; nothing here is transactional
//! across records.

use std::sync::Arc;

use super::models::{ExternalId, ExternalRecord};
use crate::data::Database;
use crate::error::AppError;

/// Document store keyed by `(collection, external id)`
#[derive(Clone)]
pub struct UpsertStore {
    db: Arc<Database>,
}

impl UpsertStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Insert or replace the stored copy of `record`
    ///
    /// Exactly one document exists for the record's external id afterwards.
    pub async fn upsert<R: ExternalRecord>(
        &self,
        collection: &str,
        record: &R,
    ) -> Result<(), AppError> {
        let key = record.external_id().to_string();
        let body = serde_json::to_value(record).map_err(|e| {
            AppError::Internal(anyhow::anyhow!(
                "failed to encode {collection} record {key}: {e}"
            ))
        })?;

        self.db.upsert_document(collection, &key, &body).await
    }

    /// Find the stored copy of an external id
    pub async fn find_one<R: ExternalRecord>(
        &self,
        collection: &str,
        key: &ExternalId,
    ) -> Result<Option<R>, AppError> {
        let Some(document) = self.db.get_document(collection, &key.to_string()).await? else {
            return Ok(None);
        };

        serde_json::from_value(document.body).map(Some).map_err(|e| {
            AppError::Decode(format!("stored {collection} record {key} does not decode: {e}"))
        })
    }
}
