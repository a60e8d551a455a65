//! Identifiers and records shared by the stores, the service and the HTTP layer.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Generates a fresh random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }

        impl From<Uuid> for $name {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }
    };
}

uuid_id!(
    /// Identifier of a blob in the blob store.
    BlobId
);

uuid_id!(
    /// Identifier of a metadata record.
    RecordId
);

/// Catalog entry describing one uploaded file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMetadata {
    /// Record identifier assigned on insert.
    pub id: RecordId,
    /// Unique, sanitized filename.
    pub filename: String,
    /// MIME type declared by the uploader.
    pub content_type: String,
    /// Size of the blob in bytes.
    pub length: u64,
    /// Blob holding the file bytes.
    pub blob_id: BlobId,
    /// Insert timestamp.
    pub upload_date: DateTime<Utc>,
}

/// Fields supplied by the service when inserting a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewFileRecord {
    /// Unique, sanitized filename.
    pub filename: String,
    /// MIME type declared by the uploader.
    pub content_type: String,
    /// Size of the blob in bytes.
    pub length: u64,
    /// Blob holding the file bytes.
    pub blob_id: BlobId,
}

/// Listing projection of a [`FileMetadata`].
///
/// `id` is the blob identifier so that entries can be fed straight back into
/// the fetch and delete endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileSummary {
    /// Blob identifier.
    pub id: BlobId,
    /// Stored filename.
    pub filename: String,
    /// Size in bytes.
    pub length: u64,
    /// Insert timestamp.
    pub upload_date: DateTime<Utc>,
}

impl From<&FileMetadata> for FileSummary {
    fn from(record: &FileMetadata) -> Self {
        Self {
            id: record.blob_id,
            filename: record.filename.clone(),
            length: record.length,
            upload_date: record.upload_date,
        }
    }
}

/// Descriptor a blob store keeps next to the chunks of each blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlobInfo {
    /// Blob identifier.
    pub id: BlobId,
    /// Filename the blob was written under.
    pub filename: String,
    /// MIME type recorded at write time.
    pub content_type: String,
    /// Total size in bytes.
    pub length: u64,
    /// Size of every chunk but the last.
    pub chunk_size: usize,
    /// Time the write completed.
    pub upload_date: DateTime<Utc>,
}

impl BlobInfo {
    /// Number of chunks the blob occupies.
    pub fn chunk_count(&self) -> u64 {
        if self.chunk_size == 0 {
            return 0;
        }
        self.length.div_ceil(self.chunk_size as u64)
    }
}

/// How a fetched file should be presented by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Display in the browser.
    Inline,
    /// Offer as a download.
    Attachment,
}

impl Disposition {
    /// Maps the `inline` flag of a fetch request to a disposition.
    pub fn from_inline(inline: bool) -> Self {
        if inline {
            Self::Inline
        } else {
            Self::Attachment
        }
    }

    /// The disposition type token.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Inline => "inline",
            Self::Attachment => "attachment",
        }
    }
}

/// Builds a `Content-Disposition` value carrying `filename`.
///
/// Non-ASCII names get an ASCII fallback in `filename` plus an RFC 5987
/// `filename*` parameter.
pub fn content_disposition(disposition: Disposition, filename: &str) -> String {
    let mut fallback = String::with_capacity(filename.len());
    for c in filename.chars() {
        match c {
            '"' | '\\' => {
                fallback.push('\\');
                fallback.push(c);
            }
            c if c.is_ascii() && !c.is_ascii_control() => fallback.push(c),
            _ => fallback.push('_'),
        }
    }

    let mut value = format!("{}; filename=\"{fallback}\"", disposition.as_str());
    if !filename.is_ascii() {
        value.push_str("; filename*=UTF-8''");
        value.push_str(&percent_encode(filename));
    }
    value
}

fn percent_encode(value: &str) -> String {
    let mut out = String::with_capacity(value.len() * 3);
    for byte in value.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'.' | b'_' | b'~') {
            out.push(byte as char);
        } else {
            out.push_str(&format!("%{byte:02X}"));
        }
    }
    out
}

/// Reduces a client-supplied filename to its final path component and drops
/// control characters.
pub fn sanitize_filename(raw: &str) -> String {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or(raw);
    let cleaned: String = base.chars().filter(|c| !c.is_control()).collect();
    let trimmed = cleaned.trim();
    if trimmed == "." || trimmed == ".." {
        return String::new();
    }
    trimmed.to_owned()
}

/// Parses a declared content type, falling back to `application/octet-stream`.
pub fn normalize_content_type(declared: Option<&str>) -> String {
    declared
        .and_then(|value| value.parse::<mime::Mime>().ok())
        .map(|mime| mime.to_string())
        .unwrap_or_else(|| FALLBACK_CONTENT_TYPE.to_owned())
}
