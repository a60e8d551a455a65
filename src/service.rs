use std::{fmt, sync::Arc};

use bytes::Bytes;
use futures::{stream, StreamExt};
use tracing::{debug, error, info, warn};

use crate::{
    blob::{BlobStore, BlobUpload, ByteStream},
    builder::FileServiceBuilder,
    error::{MetadataError, ServiceError, StorageError},
    metadata::MetadataStore,
    model::{
        content_disposition, normalize_content_type, sanitize_filename, BlobId, Disposition,
        FileMetadata, FileSummary, NewFileRecord, RecordId,
    },
};

/// An opened file ready to be streamed to a client.
pub struct FileDownload {
    /// Stored filename.
    pub filename: String,
    /// Stored MIME type.
    pub content_type: String,
    /// Total size in bytes.
    pub length: u64,
    /// Requested presentation.
    pub disposition: Disposition,
    /// File bytes. A backend failure mid-stream is yielded as an error item.
    pub body: ByteStream<'static>,
}

impl FileDownload {
    /// `Content-Disposition` header value for this download.
    pub fn content_disposition(&self) -> String {
        content_disposition(self.disposition, &self.filename)
    }

    /// Drains the body into a single buffer.
    pub async fn into_bytes(self) -> Result<Bytes, StorageError> {
        let mut buf = Vec::with_capacity(usize::try_from(self.length).unwrap_or(0));
        let mut body = self.body;
        while let Some(chunk) = body.next().await {
            buf.extend_from_slice(&chunk?);
        }
        Ok(Bytes::from(buf))
    }
}

impl fmt::Debug for FileDownload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileDownload")
            .field("filename", &self.filename)
            .field("content_type", &self.content_type)
            .field("length", &self.length)
            .field("disposition", &self.disposition)
            .finish_non_exhaustive()
    }
}

/// Orchestrates the blob store and the metadata catalog.
///
/// This is the only writer of either store. It is immutable after
/// construction and meant to be shared behind an [`Arc`].
#[derive(Debug, Clone)]
pub struct FileService {
    blobs: Arc<dyn BlobStore>,
    records: Arc<dyn MetadataStore>,
    remove_orphaned_blobs: bool,
}

impl FileService {
    /// Creates a service over the given stores, removing orphaned blobs.
    pub fn new(blobs: Arc<dyn BlobStore>, records: Arc<dyn MetadataStore>) -> Self {
        Self {
            blobs,
            records,
            remove_orphaned_blobs: true,
        }
    }

    /// Creates a fluent builder defaulting to in-memory stores.
    pub fn builder() -> FileServiceBuilder {
        FileServiceBuilder::default()
    }

    pub(crate) fn from_parts(
        blobs: Arc<dyn BlobStore>,
        records: Arc<dyn MetadataStore>,
        remove_orphaned_blobs: bool,
    ) -> Self {
        Self {
            blobs,
            records,
            remove_orphaned_blobs,
        }
    }

    /// Whether a blob left without a record after a failed insert is deleted.
    pub fn removes_orphaned_blobs(&self) -> bool {
        self.remove_orphaned_blobs
    }

    /// Stores a new file.
    ///
    /// The blob is written completely before the record is inserted. When the
    /// insert fails the blob is deleted again unless orphan removal is off.
    pub async fn upload(
        &self,
        filename: &str,
        content_type: Option<&str>,
        body: ByteStream<'_>,
    ) -> Result<FileMetadata, ServiceError> {
        let filename = sanitize_filename(filename);
        if filename.is_empty() {
            return Err(ServiceError::BadRequest("filename must not be empty".to_owned()));
        }

        let existing = self
            .records
            .find_by_filename(&filename)
            .await
            .map_err(ServiceError::DuplicateCheckFailed)?;
        if existing.is_some() {
            debug!(%filename, "rejecting duplicate filename");
            return Err(ServiceError::DuplicateName { filename });
        }

        let content_type = normalize_content_type(content_type);
        let blob = self
            .blobs
            .write(BlobUpload {
                filename: filename.clone(),
                content_type: content_type.clone(),
                body,
            })
            .await
            .map_err(ServiceError::StorageWriteFailed)?;
        debug!(%filename, blob_id = %blob.id, length = blob.length, "blob written");

        let inserted = self
            .records
            .insert(NewFileRecord {
                filename: filename.clone(),
                content_type,
                length: blob.length,
                blob_id: blob.id,
            })
            .await;

        match inserted {
            Ok(saved) => {
                info!(
                    filename = %saved.filename,
                    blob_id = %saved.blob_id,
                    length = saved.length,
                    "file uploaded"
                );
                Ok(saved)
            }
            Err(err) => {
                self.handle_orphan(blob.id, &err).await;
                match err {
                    MetadataError::Conflict { filename } => {
                        Err(ServiceError::DuplicateName { filename })
                    }
                    other => Err(ServiceError::MetadataWriteFailed(other)),
                }
            }
        }
    }

    /// Stores a new file from an in-memory payload.
    pub async fn upload_bytes(
        &self,
        filename: &str,
        content_type: Option<&str>,
        payload: Bytes,
    ) -> Result<FileMetadata, ServiceError> {
        let body = stream::once(async move { Ok(payload) }).boxed();
        self.upload(filename, content_type, body).await
    }

    async fn handle_orphan(&self, blob_id: BlobId, cause: &MetadataError) {
        if !self.remove_orphaned_blobs {
            warn!(%blob_id, error = %cause, "metadata insert failed; leaving orphaned blob");
            return;
        }

        match self.blobs.delete(blob_id).await {
            Ok(()) => warn!(%blob_id, error = %cause, "metadata insert failed; removed blob"),
            Err(err) => error!(
                %blob_id,
                error = %err,
                cause = %cause,
                "metadata insert failed and the orphaned blob could not be removed"
            ),
        }
    }

    /// All files, most recent upload first.
    pub async fn list(&self) -> Result<Vec<FileSummary>, ServiceError> {
        let records = self
            .records
            .list_newest_first()
            .await
            .map_err(ServiceError::MetadataReadFailed)?;
        Ok(records.iter().map(FileSummary::from).collect())
    }

    /// Looks up the full record for a record id.
    pub async fn record(&self, id: RecordId) -> Result<FileMetadata, ServiceError> {
        self.records
            .find_by_id(id)
            .await
            .map_err(ServiceError::MetadataReadFailed)?
            .ok_or_else(|| ServiceError::record_not_found(id))
    }

    /// Opens a blob for streaming. Absence is reported before any byte is read.
    pub async fn fetch(
        &self,
        blob_id: BlobId,
        disposition: Disposition,
    ) -> Result<FileDownload, ServiceError> {
        let download = self.blobs.open_read(blob_id).await.map_err(|err| {
            if err.is_not_found() {
                ServiceError::blob_not_found(blob_id)
            } else {
                ServiceError::StorageReadFailed(err)
            }
        })?;

        Ok(FileDownload {
            filename: download.info.filename,
            content_type: download.info.content_type,
            length: download.info.length,
            disposition,
            body: download.body,
        })
    }

    /// Deletes a blob and then its record.
    ///
    /// Succeeds once the blob is gone, even when no record matched or the
    /// record delete failed.
    pub async fn delete(&self, blob_id: BlobId) -> Result<(), ServiceError> {
        self.blobs.delete(blob_id).await.map_err(|err| {
            if err.is_not_found() {
                ServiceError::blob_not_found(blob_id)
            } else {
                ServiceError::StorageDeleteFailed(err)
            }
        })?;

        match self.records.delete_by_blob_id(blob_id).await {
            Ok(true) => info!(%blob_id, "file deleted"),
            Ok(false) => warn!(%blob_id, "blob deleted but no metadata record matched"),
            Err(err) => warn!(%blob_id, error = %err, "blob deleted but metadata cleanup failed"),
        }
        Ok(())
    }
}
