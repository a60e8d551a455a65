use std::sync::Arc;

use tokio::sync::RwLock;

use crate::{
    error::MetadataError,
    metadata::{Catalog, MetadataStore},
    model::{BlobId, FileMetadata, NewFileRecord, RecordId},
};

/// Catalog held in process memory; contents are lost on restart.
#[derive(Debug, Clone, Default)]
pub struct MemoryMetadataStore {
    catalog: Arc<RwLock<Catalog>>,
}

impl MemoryMetadataStore {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records held.
    pub async fn len(&self) -> usize {
        self.catalog.read().await.records().len()
    }

    /// Returns `true` when the catalog is empty.
    pub async fn is_empty(&self) -> bool {
        self.catalog.read().await.records().is_empty()
    }
}

#[async_trait::async_trait]
impl MetadataStore for MemoryMetadataStore {
    async fn insert(&self, record: NewFileRecord) -> Result<FileMetadata, MetadataError> {
        self.catalog.write().await.insert(record)
    }

    async fn find_by_filename(&self, filename: &str) -> Result<Option<FileMetadata>, MetadataError> {
        Ok(self.catalog.read().await.find_by_filename(filename).cloned())
    }

    async fn find_by_id(&self, id: RecordId) -> Result<Option<FileMetadata>, MetadataError> {
        Ok(self.catalog.read().await.find_by_id(id).cloned())
    }

    async fn delete_by_blob_id(&self, blob_id: BlobId) -> Result<bool, MetadataError> {
        Ok(self.catalog.write().await.delete_by_blob_id(blob_id).is_some())
    }

    async fn list_newest_first(&self) -> Result<Vec<FileMetadata>, MetadataError> {
        Ok(self.catalog.read().await.newest_first())
    }
}
