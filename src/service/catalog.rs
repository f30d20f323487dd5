//! Catalog service
//!
//! Read side of the synced Launch Library 2 collections. Pages and single
//! documents are served through the read cache under the collection's
//! namespace, which sync runs invalidate.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::data::{Database, ReadCache};
use crate::error::AppError;
use crate::sync::SyncResource;

/// One page of stored documents
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogPage {
    /// Total documents in the collection
    pub count: i64,
    pub results: Vec<serde_json::Value>,
}

pub struct CatalogService {
    db: Arc<Database>,
    cache: Arc<ReadCache>,
}

impl CatalogService {
    pub fn new(db: Arc<Database>, cache: Arc<ReadCache>) -> Self {
        Self { db, cache }
    }

    /// List documents of `resource` ordered by upstream id
    pub async fn list(
        &self,
        resource: SyncResource,
        limit: i64,
        offset: i64,
    ) -> Result<CatalogPage, AppError> {
        let collection = document_collection(resource)?;
        let key = format!("{collection}:list:{limit}:{offset}");

        self.cache
            .get_or_load(key, move || async move {
                let count = self.db.count_documents(collection).await?;
                let documents = self.db.list_documents(collection, limit, offset).await?;

                Ok(CatalogPage {
                    count,
                    results: documents.into_iter().map(|doc| doc.body).collect(),
                })
            })
            .await
    }

    /// Get one document by its upstream id
    ///
    /// # Errors
    /// `NotFound` if the id has never been synced
    pub async fn get(
        &self,
        resource: SyncResource,
        external_id: &str,
    ) -> Result<serde_json::Value, AppError> {
        let collection = document_collection(resource)?;
        let key = format!("{collection}:item:{external_id}");

        self.cache
            .get_or_load(key, move || async move {
                self.db
                    .get_document(collection, external_id)
                    .await?
                    .map(|doc| doc.body)
                    .ok_or(AppError::NotFound)
            })
            .await
    }
}

fn document_collection(resource: SyncResource) -> Result<&'static str, AppError> {
    if !resource.is_document_collection() {
        return Err(AppError::Validation(format!(
            "{resource} is not a document collection"
        )));
    }
    Ok(resource.collection())
}
