use thiserror::Error;

use crate::model::{BlobId, RecordId};

/// Error reported by a [`BlobStore`](crate::BlobStore) backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// No blob exists under the requested identifier.
    #[error("blob `{0}` not found")]
    NotFound(BlobId),
    /// Filesystem or transport failure inside the backend.
    #[error("blob store i/o error: {0}")]
    Io(#[from] std::io::Error),
    /// The incoming byte stream exceeded the request body limit.
    #[error("upload exceeds the request body limit")]
    TooLarge,
    /// The incoming byte stream failed while it was being written.
    #[error("upload stream error: {0}")]
    Stream(String),
    /// Persisted blob state could not be interpreted.
    #[error("corrupt blob `{id}`: {reason}")]
    Corrupt {
        /// Blob whose on-disk state is inconsistent.
        id: BlobId,
        /// Human-readable description of the inconsistency.
        reason: String,
    },
}

impl StorageError {
    /// Creates a stream error from any displayable message.
    pub fn stream(message: impl Into<String>) -> Self {
        Self::Stream(message.into())
    }

    /// Returns `true` when the error means the blob does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Error reported by a [`MetadataStore`](crate::MetadataStore) backend.
#[derive(Debug, Error)]
pub enum MetadataError {
    /// A record with the same filename already exists.
    #[error("a record named `{filename}` already exists")]
    Conflict {
        /// The filename that collided.
        filename: String,
    },
    /// Filesystem failure while persisting the catalog.
    #[error("metadata store i/o error: {0}")]
    Io(#[from] std::io::Error),
    /// The catalog could not be encoded or decoded.
    #[error("metadata serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Error returned by [`FileService`](crate::FileService) operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The request is missing required input.
    #[error("bad request: {0}")]
    BadRequest(String),
    /// Another file already uses this filename.
    #[error("a file named `{filename}` already exists")]
    DuplicateName {
        /// The rejected filename.
        filename: String,
    },
    /// The blob identifier is unknown or malformed.
    #[error("file `{0}` not found")]
    NotFound(String),
    /// Writing blob bytes failed.
    #[error("blob write failed: {0}")]
    StorageWriteFailed(#[source] StorageError),
    /// Deleting a blob failed for a reason other than absence.
    #[error("blob delete failed: {0}")]
    StorageDeleteFailed(#[source] StorageError),
    /// Reading blob bytes failed for a reason other than absence.
    #[error("blob read failed: {0}")]
    StorageReadFailed(#[source] StorageError),
    /// The metadata record could not be inserted after the blob was written.
    #[error("metadata write failed: {0}")]
    MetadataWriteFailed(#[source] MetadataError),
    /// The duplicate-name lookup that precedes an upload failed.
    #[error("duplicate check failed: {0}")]
    DuplicateCheckFailed(#[source] MetadataError),
    /// Querying the metadata catalog failed.
    #[error("metadata read failed: {0}")]
    MetadataReadFailed(#[source] MetadataError),
    /// Unclassified failure.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    pub(crate) fn blob_not_found(id: BlobId) -> Self {
        Self::NotFound(id.to_string())
    }

    pub(crate) fn record_not_found(id: RecordId) -> Self {
        Self::NotFound(id.to_string())
    }
}

/// Configuration validation error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Chunk size must be at least one byte.
    #[error("storage.chunk_size must be greater than zero")]
    ZeroChunkSize,
    /// The disk backend needs a directory to write into.
    #[error("storage.path must not be empty when the disk backend is selected")]
    EmptyStoragePath,
    /// A CORS origin is not a valid header value.
    #[error("invalid CORS origin `{origin}`")]
    InvalidCorsOrigin {
        /// The offending origin string.
        origin: String,
    },
    /// The configuration file could not be read or parsed.
    #[error("failed to load configuration: {0}")]
    Load(String),
}
