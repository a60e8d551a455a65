//! Metadata record store abstractions and built-in backends.

use std::fmt;

use chrono::{DateTime, Duration, Utc};

use crate::{
    error::MetadataError,
    model::{BlobId, FileMetadata, NewFileRecord, RecordId},
};

/// Catalog persisted as a JSON file.
pub mod json;
/// Purely in-memory catalog.
pub mod memory;

pub use json::JsonMetadataStore;
pub use memory::MemoryMetadataStore;

/// Async trait abstraction for the file catalog.
#[async_trait::async_trait]
pub trait MetadataStore: Send + Sync + fmt::Debug {
    /// Inserts a record, assigning its id and upload date.
    ///
    /// Fails with [`MetadataError::Conflict`] when the filename is taken; the
    /// check and the insert happen atomically.
    async fn insert(&self, record: NewFileRecord) -> Result<FileMetadata, MetadataError>;

    /// Looks a record up by filename.
    async fn find_by_filename(&self, filename: &str) -> Result<Option<FileMetadata>, MetadataError>;

    /// Looks a record up by its record id.
    async fn find_by_id(&self, id: RecordId) -> Result<Option<FileMetadata>, MetadataError>;

    /// Removes the record linked to `blob_id`; returns whether one matched.
    async fn delete_by_blob_id(&self, blob_id: BlobId) -> Result<bool, MetadataError>;

    /// All records, most recent upload first.
    async fn list_newest_first(&self) -> Result<Vec<FileMetadata>, MetadataError>;
}

/// Record set shared by the built-in backends.
///
/// Upload dates are strictly increasing so that listing order is total even
/// when inserts land within the clock's resolution.
#[derive(Debug, Default)]
pub(crate) struct Catalog {
    records: Vec<FileMetadata>,
    last_upload: Option<DateTime<Utc>>,
}

impl Catalog {
    pub(crate) fn from_records(mut records: Vec<FileMetadata>) -> Self {
        records.sort_by_key(|record| record.upload_date);
        let last_upload = records.last().map(|record| record.upload_date);
        Self {
            records,
            last_upload,
        }
    }

    pub(crate) fn records(&self) -> &[FileMetadata] {
        &self.records
    }

    pub(crate) fn insert(&mut self, record: NewFileRecord) -> Result<FileMetadata, MetadataError> {
        if self.find_by_filename(&record.filename).is_some() {
            return Err(MetadataError::Conflict {
                filename: record.filename,
            });
        }

        let now = Utc::now();
        let upload_date = match self.last_upload {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        };
        self.last_upload = Some(upload_date);

        let saved = FileMetadata {
            id: RecordId::new(),
            filename: record.filename,
            content_type: record.content_type,
            length: record.length,
            blob_id: record.blob_id,
            upload_date,
        };
        self.records.push(saved.clone());
        Ok(saved)
    }

    pub(crate) fn find_by_filename(&self, filename: &str) -> Option<&FileMetadata> {
        self.records.iter().find(|record| record.filename == filename)
    }

    pub(crate) fn find_by_id(&self, id: RecordId) -> Option<&FileMetadata> {
        self.records.iter().find(|record| record.id == id)
    }

    pub(crate) fn delete_by_blob_id(&mut self, blob_id: BlobId) -> Option<FileMetadata> {
        let index = self
            .records
            .iter()
            .position(|record| record.blob_id == blob_id)?;
        Some(self.records.remove(index))
    }

    pub(crate) fn newest_first(&self) -> Vec<FileMetadata> {
        let mut records = self.records.clone();
        records.sort_by(|a, b| b.upload_date.cmp(&a.upload_date));
        records
    }
}
