#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Upload, list, stream and delete PDF documents over a chunked blob store
//! and a metadata catalog.
//!
//! [`FileService`] owns the decision logic and is the only writer of either
//! store. [`api::router`] exposes it over HTTP.

/// Axum request layer.
pub mod api;
/// Backend construction from configuration.
pub mod backend;
/// Blob store trait and chunked backends.
pub mod blob;
/// Fluent service builder.
pub mod builder;
/// Service configuration.
pub mod config;
/// Error types exposed by this crate.
pub mod error;
/// Metadata store trait and backends.
pub mod metadata;
/// Identifiers, records and header helpers.
pub mod model;
/// File service orchestration.
pub mod service;
/// Logging setup.
pub mod telemetry;

pub use blob::{
    BlobDownload, BlobStore, BlobUpload, ByteStream, DiskBlobStore, MemoryBlobStore,
    DEFAULT_CHUNK_SIZE,
};
pub use builder::FileServiceBuilder;
pub use config::{AppConfig, LoggingConfig, ServerConfig, StorageBackend, StorageConfig};
pub use error::{ConfigError, MetadataError, ServiceError, StorageError};
pub use metadata::{JsonMetadataStore, MemoryMetadataStore, MetadataStore};
pub use model::{
    BlobId, BlobInfo, Disposition, FileMetadata, FileSummary, NewFileRecord, RecordId,
};
pub use service::{FileDownload, FileService};
