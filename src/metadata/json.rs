use std::{io, path::PathBuf};

use tokio::{fs, sync::Mutex};

use crate::{
    error::MetadataError,
    metadata::{Catalog, MetadataStore},
    model::{BlobId, FileMetadata, NewFileRecord, RecordId},
};

/// Catalog mirrored to a JSON file after every mutation.
///
/// The file is rewritten through a temporary sibling and a rename, so a crash
/// leaves either the previous or the new catalog on disk. A failed write
/// rolls the in-memory change back.
#[derive(Debug)]
pub struct JsonMetadataStore {
    path: PathBuf,
    catalog: Mutex<Catalog>,
}

impl JsonMetadataStore {
    /// Loads the catalog at `path`, starting empty when the file is absent.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, MetadataError> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }

        let records = match fs::read(&path).await {
            Ok(raw) => serde_json::from_slice::<Vec<FileMetadata>>(&raw)?,
            Err(err) if err.kind() == io::ErrorKind::NotFound => Vec::new(),
            Err(err) => return Err(err.into()),
        };
        tracing::debug!(path = %path.display(), records = records.len(), "loaded metadata catalog");

        Ok(Self {
            path,
            catalog: Mutex::new(Catalog::from_records(records)),
        })
    }

    async fn persist(&self, catalog: &Catalog) -> Result<(), MetadataError> {
        let encoded = serde_json::to_vec_pretty(catalog.records())?;
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        fs::write(&tmp, encoded).await?;
        fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl MetadataStore for JsonMetadataStore {
    async fn insert(&self, record: NewFileRecord) -> Result<FileMetadata, MetadataError> {
        let mut catalog = self.catalog.lock().await;
        let saved = catalog.insert(record)?;
        if let Err(err) = self.persist(&catalog).await {
            catalog.delete_by_blob_id(saved.blob_id);
            return Err(err);
        }
        Ok(saved)
    }

    async fn find_by_filename(&self, filename: &str) -> Result<Option<FileMetadata>, MetadataError> {
        Ok(self.catalog.lock().await.find_by_filename(filename).cloned())
    }

    async fn find_by_id(&self, id: RecordId) -> Result<Option<FileMetadata>, MetadataError> {
        Ok(self.catalog.lock().await.find_by_id(id).cloned())
    }

    async fn delete_by_blob_id(&self, blob_id: BlobId) -> Result<bool, MetadataError> {
        let mut catalog = self.catalog.lock().await;
        let Some(removed) = catalog.delete_by_blob_id(blob_id) else {
            return Ok(false);
        };
        if let Err(err) = self.persist(&catalog).await {
            let mut records = catalog.records().to_vec();
            records.push(removed);
            *catalog = Catalog::from_records(records);
            return Err(err);
        }
        Ok(true)
    }

    async fn list_newest_first(&self) -> Result<Vec<FileMetadata>, MetadataError> {
        Ok(self.catalog.lock().await.newest_first())
    }
}
