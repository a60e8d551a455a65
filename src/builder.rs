use std::sync::Arc;

use crate::{
    blob::{BlobStore, MemoryBlobStore},
    metadata::{MemoryMetadataStore, MetadataStore},
    service::FileService,
};

/// Builder for configuring a [`FileService`].
///
/// Stores left unset default to their in-memory implementations.
#[derive(Debug, Clone)]
pub struct FileServiceBuilder {
    blobs: Option<Arc<dyn BlobStore>>,
    records: Option<Arc<dyn MetadataStore>>,
    remove_orphaned_blobs: bool,
}

impl Default for FileServiceBuilder {
    fn default() -> Self {
        Self {
            blobs: None,
            records: None,
            remove_orphaned_blobs: true,
        }
    }
}

impl FileServiceBuilder {
    /// Creates a builder with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the blob store.
    pub fn blob_store(mut self, blobs: impl BlobStore + 'static) -> Self {
        self.blobs = Some(Arc::new(blobs));
        self
    }

    /// Sets an already shared blob store.
    pub fn shared_blob_store(mut self, blobs: Arc<dyn BlobStore>) -> Self {
        self.blobs = Some(blobs);
        self
    }

    /// Sets the metadata store.
    pub fn metadata_store(mut self, records: impl MetadataStore + 'static) -> Self {
        self.records = Some(Arc::new(records));
        self
    }

    /// Sets an already shared metadata store.
    pub fn shared_metadata_store(mut self, records: Arc<dyn MetadataStore>) -> Self {
        self.records = Some(records);
        self
    }

    /// Whether to delete a freshly written blob when its record cannot be inserted.
    pub fn remove_orphaned_blobs(mut self, enabled: bool) -> Self {
        self.remove_orphaned_blobs = enabled;
        self
    }

    /// Builds the service.
    pub fn build(self) -> FileService {
        let blobs = self
            .blobs
            .unwrap_or_else(|| Arc::new(MemoryBlobStore::new()));
        let records = self
            .records
            .unwrap_or_else(|| Arc::new(MemoryMetadataStore::new()));
        FileService::from_parts(blobs, records, self.remove_orphaned_blobs)
    }
}
