use axum::{
    body::Body,
    extract::{multipart::MultipartRejection, Multipart, Path, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use futures::{StreamExt, TryStreamExt};
use serde::{Deserialize, Serialize};

use crate::{
    api::{ApiError, AppState, UPLOAD_FIELD},
    error::{ServiceError, StorageError},
    model::{BlobId, Disposition, FileMetadata, FileSummary},
};

/// Body of a successful upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    /// The saved record.
    pub file: FileMetadata,
    /// Confirmation text.
    pub message: String,
}

/// Body of a successful delete.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    /// Confirmation text.
    pub message: String,
}

/// `POST /upload`: stores the first file part named `file`.
pub async fn upload(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut multipart = multipart?;
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let Some(filename) = field.file_name().map(ToOwned::to_owned) else {
            continue;
        };
        let content_type = field.content_type().map(ToOwned::to_owned);

        let body = field
            .map_err(|err| {
                if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
                    StorageError::TooLarge
                } else {
                    StorageError::stream(err.body_text())
                }
            })
            .boxed();
        let file = state
            .files
            .upload(&filename, content_type.as_deref(), body)
            .await?;

        return Ok(Json(UploadResponse {
            file,
            message: "File uploaded successfully".to_owned(),
        }));
    }

    Err(ApiError::NoFile)
}

/// `GET /`: lists files newest first.
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<FileSummary>>, ApiError> {
    Ok(Json(state.files.list().await?))
}

/// `GET /pdf/:file_id`: streams a file as an attachment.
pub async fn download(
    State(state): State<AppState>,
    Path(file_id): Path<String>,
) -> Result<Response, ApiError> {
    stream_file(&state, &file_id, Disposition::Attachment).await
}

/// `GET /pdf/:file_id/view`: streams a file for inline display.
pub async fn view(
    State(state): State<AppState>,
    Path(file_id): Path<String>,
) -> Result<Response, ApiError> {
    stream_file(&state, &file_id, Disposition::Inline).await
}

/// `DELETE /pdf/:file_id/delete`: removes a file.
pub async fn remove(
    State(state): State<AppState>,
    Path(file_id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let blob_id = parse_blob_id(&file_id)?;
    state.files.delete(blob_id).await?;
    Ok(Json(MessageResponse {
        message: "File and document successfully deleted".to_owned(),
    }))
}

async fn stream_file(
    state: &AppState,
    file_id: &str,
    disposition: Disposition,
) -> Result<Response, ApiError> {
    let blob_id = parse_blob_id(file_id)?;
    let download = state.files.fetch(blob_id, disposition).await?;

    let content_type = HeaderValue::from_str(&download.content_type)
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));
    let content_disposition = HeaderValue::from_str(&download.content_disposition())
        .map_err(|err| ServiceError::Internal(format!("invalid Content-Disposition: {err}")))?;

    Ok((
        [
            (header::CONTENT_TYPE, content_type),
            (header::CONTENT_DISPOSITION, content_disposition),
            (header::CONTENT_LENGTH, HeaderValue::from(download.length)),
        ],
        Body::from_stream(download.body),
    )
        .into_response())
}

fn parse_blob_id(raw: &str) -> Result<BlobId, ServiceError> {
    raw.parse()
        .map_err(|_| ServiceError::NotFound(raw.to_owned()))
}
