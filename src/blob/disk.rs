use std::{
    io,
    path::{Path, PathBuf},
};

use chrono::Utc;
use futures::{stream, StreamExt, TryStreamExt};
use tokio::{fs, io::AsyncWriteExt};
use tokio_util::io::ReaderStream;

use crate::{
    blob::{BlobDownload, BlobStore, BlobUpload, Chunked, DEFAULT_CHUNK_SIZE},
    error::StorageError,
    model::{BlobId, BlobInfo},
};

const INFO_FILE: &str = "info.json";
const CHUNKS_DIR: &str = "chunks";
const PARTIAL_PREFIX: &str = ".partial-";
const DELETING_PREFIX: &str = ".deleting-";

/// Chunked blob store rooted at a directory.
///
/// Layout per blob:
///
/// ```text
/// <root>/<blob-id>/info.json
/// <root>/<blob-id>/chunks/00000000
/// <root>/<blob-id>/chunks/00000001
/// ```
///
/// Writes land in a `.partial-<id>` directory that is renamed into place once
/// every chunk and the descriptor are on disk.
#[derive(Debug, Clone)]
pub struct DiskBlobStore {
    root: PathBuf,
    chunk_size: usize,
}

impl DiskBlobStore {
    /// Opens (creating if needed) a store under `root` using [`DEFAULT_CHUNK_SIZE`].
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        Self::with_chunk_size(root, DEFAULT_CHUNK_SIZE).await
    }

    /// Opens a store with an explicit chunk size and sweeps leftovers of
    /// interrupted writes and deletes.
    pub async fn with_chunk_size(
        root: impl Into<PathBuf>,
        chunk_size: usize,
    ) -> Result<Self, StorageError> {
        let root = root.into();
        fs::create_dir_all(&root).await?;

        let mut entries = fs::read_dir(&root).await?;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name.starts_with(PARTIAL_PREFIX) || name.starts_with(DELETING_PREFIX) {
                tracing::debug!(path = %entry.path().display(), "removing stale blob directory");
                fs::remove_dir_all(entry.path()).await?;
            }
        }

        Ok(Self {
            root,
            chunk_size: chunk_size.max(1),
        })
    }

    /// Returns `true` when a completed blob exists under `id`.
    pub async fn contains(&self, id: BlobId) -> bool {
        fs::try_exists(self.blob_dir(id).join(INFO_FILE))
            .await
            .unwrap_or(false)
    }

    fn blob_dir(&self, id: BlobId) -> PathBuf {
        self.root.join(id.to_string())
    }

    async fn write_into(
        &self,
        dir: &Path,
        id: BlobId,
        upload: BlobUpload<'_>,
    ) -> Result<BlobInfo, StorageError> {
        let chunks_dir = dir.join(CHUNKS_DIR);
        fs::create_dir_all(&chunks_dir).await?;

        let mut chunked = Chunked::new(upload.body, self.chunk_size);
        let mut index = 0u64;
        let mut length = 0u64;
        while let Some(chunk) = chunked.next().await {
            let chunk = chunk?;
            let mut file = fs::File::create(chunk_path(&chunks_dir, index)).await?;
            file.write_all(&chunk).await?;
            file.flush().await?;
            length += chunk.len() as u64;
            index += 1;
        }

        let info = BlobInfo {
            id,
            filename: upload.filename,
            content_type: upload.content_type,
            length,
            chunk_size: self.chunk_size,
            upload_date: Utc::now(),
        };
        let encoded = serde_json::to_vec_pretty(&info).map_err(io::Error::other)?;
        fs::write(dir.join(INFO_FILE), encoded).await?;
        Ok(info)
    }

    async fn read_info(&self, id: BlobId) -> Result<BlobInfo, StorageError> {
        let raw = match fs::read(self.blob_dir(id).join(INFO_FILE)).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(StorageError::NotFound(id))
            }
            Err(err) => return Err(err.into()),
        };
        serde_json::from_slice(&raw).map_err(|err| StorageError::Corrupt {
            id,
            reason: format!("unreadable descriptor: {err}"),
        })
    }
}

#[async_trait::async_trait]
impl BlobStore for DiskBlobStore {
    async fn write(&self, upload: BlobUpload<'_>) -> Result<BlobInfo, StorageError> {
        let id = BlobId::new();
        let partial = self.root.join(format!("{PARTIAL_PREFIX}{id}"));

        match self.write_into(&partial, id, upload).await {
            Ok(info) => {
                fs::rename(&partial, self.blob_dir(id)).await?;
                Ok(info)
            }
            Err(err) => {
                if let Err(cleanup) = fs::remove_dir_all(&partial).await {
                    tracing::warn!(blob_id = %id, error = %cleanup, "failed to remove partial blob");
                }
                Err(err)
            }
        }
    }

    async fn open_read(&self, id: BlobId) -> Result<BlobDownload, StorageError> {
        let info = self.read_info(id).await?;
        let chunks_dir = self.blob_dir(id).join(CHUNKS_DIR);
        let chunk_size = info.chunk_size.max(1);

        let body = stream::iter(0..info.chunk_count())
            .then(move |index| {
                let path = chunk_path(&chunks_dir, index);
                async move {
                    match fs::File::open(&path).await {
                        Ok(file) => Ok(ReaderStream::with_capacity(file, chunk_size)
                            .map_err(StorageError::from)),
                        Err(err) if err.kind() == io::ErrorKind::NotFound => {
                            Err(StorageError::Corrupt {
                                id,
                                reason: format!("missing chunk {index}"),
                            })
                        }
                        Err(err) => Err(err.into()),
                    }
                }
            })
            .try_flatten()
            .boxed();

        Ok(BlobDownload { info, body })
    }

    async fn delete(&self, id: BlobId) -> Result<(), StorageError> {
        let dir = self.blob_dir(id);
        if !fs::try_exists(dir.join(INFO_FILE)).await? {
            return Err(StorageError::NotFound(id));
        }

        let doomed = self.root.join(format!("{DELETING_PREFIX}{id}"));
        match fs::rename(&dir, &doomed).await {
            Ok(()) => {}
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(StorageError::NotFound(id))
            }
            Err(err) => return Err(err.into()),
        }
        fs::remove_dir_all(&doomed).await?;
        Ok(())
    }
}

fn chunk_path(chunks_dir: &Path, index: u64) -> PathBuf {
    chunks_dir.join(format!("{index:08}"))
}
