use std::{error::Error, sync::Arc};

use tracing::info;

use crate::{
    blob::{BlobStore, DiskBlobStore, MemoryBlobStore},
    config::{StorageBackend, StorageConfig},
    metadata::{JsonMetadataStore, MemoryMetadataStore, MetadataStore},
    service::FileService,
};

const BLOBS_DIR: &str = "blobs";
const CATALOG_FILE: &str = "catalog.json";

/// Opens the configured stores and wires them into a [`FileService`].
///
/// The disk backend keeps chunks under `<path>/blobs` and the catalog in
/// `<path>/catalog.json`.
pub async fn build_service(
    config: &StorageConfig,
) -> Result<FileService, Box<dyn Error + Send + Sync>> {
    let (blobs, records): (Arc<dyn BlobStore>, Arc<dyn MetadataStore>) = match config.backend {
        StorageBackend::Memory => {
            info!(chunk_size = config.chunk_size, "using in-memory storage");
            (
                Arc::new(MemoryBlobStore::with_chunk_size(config.chunk_size)),
                Arc::new(MemoryMetadataStore::new()),
            )
        }
        StorageBackend::Disk => {
            info!(
                path = %config.path.display(),
                chunk_size = config.chunk_size,
                "using disk storage"
            );
            let blobs =
                DiskBlobStore::with_chunk_size(config.path.join(BLOBS_DIR), config.chunk_size)
                    .await?;
            let records = JsonMetadataStore::open(config.path.join(CATALOG_FILE)).await?;
            (Arc::new(blobs), Arc::new(records))
        }
    };

    Ok(FileService::builder()
        .shared_blob_store(blobs)
        .shared_metadata_store(records)
        .remove_orphaned_blobs(config.remove_orphaned_blobs)
        .build())
}
