use std::{collections::HashMap, sync::Arc};

use bytes::Bytes;
use chrono::Utc;
use futures::{stream, StreamExt};
use tokio::sync::RwLock;

use crate::{
    blob::{BlobDownload, BlobStore, BlobUpload, Chunked, DEFAULT_CHUNK_SIZE},
    error::StorageError,
    model::{BlobId, BlobInfo},
};

#[derive(Debug)]
struct StoredBlob {
    info: BlobInfo,
    chunks: Vec<Bytes>,
}

/// In-memory blob store keeping each blob as a vector of fixed-size chunks.
#[derive(Debug, Clone)]
pub struct MemoryBlobStore {
    blobs: Arc<RwLock<HashMap<BlobId, StoredBlob>>>,
    chunk_size: usize,
}

impl Default for MemoryBlobStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBlobStore {
    /// Creates an empty store using [`DEFAULT_CHUNK_SIZE`].
    pub fn new() -> Self {
        Self::with_chunk_size(DEFAULT_CHUNK_SIZE)
    }

    /// Creates an empty store with an explicit chunk size (clamped to at least one byte).
    pub fn with_chunk_size(chunk_size: usize) -> Self {
        Self {
            blobs: Arc::default(),
            chunk_size: chunk_size.max(1),
        }
    }

    /// Number of blobs currently held.
    pub async fn len(&self) -> usize {
        self.blobs.read().await.len()
    }

    /// Returns `true` when no blobs are held.
    pub async fn is_empty(&self) -> bool {
        self.blobs.read().await.is_empty()
    }

    /// Number of chunks stored for `id`, if it exists.
    pub async fn chunk_count(&self, id: BlobId) -> Option<usize> {
        self.blobs.read().await.get(&id).map(|blob| blob.chunks.len())
    }
}

#[async_trait::async_trait]
impl BlobStore for MemoryBlobStore {
    async fn write(&self, upload: BlobUpload<'_>) -> Result<BlobInfo, StorageError> {
        let mut chunked = Chunked::new(upload.body, self.chunk_size);
        let mut chunks = Vec::new();
        let mut length = 0u64;
        while let Some(chunk) = chunked.next().await {
            let chunk = chunk?;
            length += chunk.len() as u64;
            chunks.push(chunk);
        }

        let info = BlobInfo {
            id: BlobId::new(),
            filename: upload.filename,
            content_type: upload.content_type,
            length,
            chunk_size: self.chunk_size,
            upload_date: Utc::now(),
        };
        self.blobs.write().await.insert(
            info.id,
            StoredBlob {
                info: info.clone(),
                chunks,
            },
        );
        Ok(info)
    }

    async fn open_read(&self, id: BlobId) -> Result<BlobDownload, StorageError> {
        let blobs = self.blobs.read().await;
        let blob = blobs.get(&id).ok_or(StorageError::NotFound(id))?;
        let chunks = blob.chunks.clone();
        Ok(BlobDownload {
            info: blob.info.clone(),
            body: stream::iter(chunks.into_iter().map(Ok)).boxed(),
        })
    }

    async fn delete(&self, id: BlobId) -> Result<(), StorageError> {
        self.blobs
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(StorageError::NotFound(id))
    }
}
