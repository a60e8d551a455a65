//! Blob store abstractions and built-in chunked backends.

use std::fmt;

use bytes::Bytes;
use futures::stream::BoxStream;

use crate::{error::StorageError, model::BlobId, model::BlobInfo};

/// Fixed-size re-chunking stream adapter.
pub mod chunker;
/// Directory-backed chunked blob store.
pub mod disk;
/// In-memory chunked blob store.
pub mod memory;

pub use chunker::Chunked;
pub use disk::DiskBlobStore;
pub use memory::MemoryBlobStore;

/// Chunk size used when none is configured (255 KiB).
pub const DEFAULT_CHUNK_SIZE: usize = 255 * 1024;

/// Byte stream flowing into or out of a blob store.
pub type ByteStream<'a> = BoxStream<'a, Result<Bytes, StorageError>>;

/// A streamed write request.
pub struct BlobUpload<'a> {
    /// Filename recorded with the blob.
    pub filename: String,
    /// MIME type recorded with the blob.
    pub content_type: String,
    /// Payload, consumed to completion by the store.
    pub body: ByteStream<'a>,
}

impl fmt::Debug for BlobUpload<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlobUpload")
            .field("filename", &self.filename)
            .field("content_type", &self.content_type)
            .finish_non_exhaustive()
    }
}

/// An opened blob: its descriptor plus the chunk stream.
pub struct BlobDownload {
    /// Descriptor recorded at write time.
    pub info: BlobInfo,
    /// Chunks in order. A mid-stream failure is yielded as an error item.
    pub body: ByteStream<'static>,
}

impl fmt::Debug for BlobDownload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlobDownload")
            .field("info", &self.info)
            .finish_non_exhaustive()
    }
}

/// Async trait abstraction for blob storage backends.
///
/// A blob becomes readable only once [`write`](BlobStore::write) returns
/// successfully; a failed write leaves nothing behind.
#[async_trait::async_trait]
pub trait BlobStore: Send + Sync + fmt::Debug {
    /// Streams an upload into a new blob and returns its descriptor.
    async fn write(&self, upload: BlobUpload<'_>) -> Result<BlobInfo, StorageError>;

    /// Opens a blob for streamed reading.
    ///
    /// Returns [`StorageError::NotFound`] before any chunk is produced when
    /// the blob does not exist.
    async fn open_read(&self, id: BlobId) -> Result<BlobDownload, StorageError>;

    /// Removes a blob and all of its chunks.
    async fn delete(&self, id: BlobId) -> Result<(), StorageError>;
}
