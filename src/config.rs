//! TOML-backed service configuration.

use std::path::{Path, PathBuf};

use http::HeaderValue;
use serde::Deserialize;

use crate::{blob::DEFAULT_CHUNK_SIZE, error::ConfigError};

/// Top-level configuration file layout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP listener settings.
    pub server: ServerConfig,
    /// Blob and metadata backend settings.
    pub storage: StorageConfig,
    /// Log output settings.
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Reads `path`, or returns defaults when the file does not exist.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)
            .map_err(|err| ConfigError::Load(format!("{}: {err}", path.display())))?;
        Self::from_toml(&contents)
    }

    /// Parses and validates a TOML document.
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(contents).map_err(|err| ConfigError::Load(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks invariants serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storage.chunk_size == 0 {
            return Err(ConfigError::ZeroChunkSize);
        }
        if self.storage.backend == StorageBackend::Disk && self.storage.path.as_os_str().is_empty()
        {
            return Err(ConfigError::EmptyStoragePath);
        }
        self.server.cors_origins()?;
        Ok(())
    }
}

/// HTTP listener configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Largest accepted request body in bytes; `0` disables the limit.
    pub max_upload_bytes: usize,
    /// Origins allowed by CORS. Empty or `*` allows any origin.
    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 3000,
            max_upload_bytes: 64 * 1024 * 1024,
            cors_allowed_origins: Vec::new(),
        }
    }
}

impl ServerConfig {
    /// Parsed CORS origins, or `None` when any origin is allowed.
    pub fn cors_origins(&self) -> Result<Option<Vec<HeaderValue>>, ConfigError> {
        if self.cors_allowed_origins.is_empty()
            || self.cors_allowed_origins.iter().any(|origin| origin == "*")
        {
            return Ok(None);
        }
        self.cors_allowed_origins
            .iter()
            .map(|origin| {
                HeaderValue::from_str(origin).map_err(|_| ConfigError::InvalidCorsOrigin {
                    origin: origin.clone(),
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Some)
    }

    /// The request body limit, if enabled.
    pub fn body_limit(&self) -> Option<usize> {
        (self.max_upload_bytes > 0).then_some(self.max_upload_bytes)
    }
}

/// Which storage backends to run on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Everything in process memory.
    #[default]
    Memory,
    /// Chunk files and a JSON catalog under `storage.path`.
    Disk,
}

/// Storage configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Backend selection.
    pub backend: StorageBackend,
    /// Data directory for the disk backend.
    pub path: PathBuf,
    /// Blob chunk size in bytes.
    pub chunk_size: usize,
    /// Delete a blob whose metadata record could not be inserted.
    pub remove_orphaned_blobs: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Memory,
            path: PathBuf::from("./data"),
            chunk_size: DEFAULT_CHUNK_SIZE,
            remove_orphaned_blobs: true,
        }
    }
}

/// Log output configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub filter: String,
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_owned(),
            json: false,
        }
    }
}
