use axum::{
    extract::multipart::{MultipartError, MultipartRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::error::{ServiceError, StorageError};

/// Error returned by HTTP handlers.
///
/// Clients only ever see a short message; details go to the log.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The multipart body had no `file` part.
    #[error("no file uploaded")]
    NoFile,
    /// The request was not a multipart form.
    #[error("not a multipart request: {0}")]
    NotMultipart(#[from] MultipartRejection),
    /// The multipart body could not be decoded.
    #[error("multipart error: {0}")]
    Multipart(#[from] MultipartError),
    /// A file service operation failed.
    #[error(transparent)]
    Service(#[from] ServiceError),
}

impl ApiError {
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            Self::NoFile | Self::NotMultipart(_) => {
                (StatusCode::BAD_REQUEST, "No file uploaded".to_owned())
            }
            Self::Multipart(err) => multipart_status(err.status()),
            Self::Service(err) => service_status(err),
        }
    }
}

fn multipart_status(status: StatusCode) -> (StatusCode, String) {
    let (status, message) = if status == StatusCode::PAYLOAD_TOO_LARGE {
        (status, "File too large")
    } else if status.is_server_error() {
        (StatusCode::INTERNAL_SERVER_ERROR, "Error uploading file")
    } else {
        (StatusCode::BAD_REQUEST, "No file uploaded")
    };
    (status, message.to_owned())
}

fn service_status(err: &ServiceError) -> (StatusCode, String) {
    let (status, message) = match err {
        ServiceError::BadRequest(message) => return (StatusCode::BAD_REQUEST, message.clone()),
        ServiceError::DuplicateName { .. } => (
            StatusCode::BAD_REQUEST,
            "A file with the same name already exists. Please choose a different name.",
        ),
        ServiceError::NotFound(_) => (StatusCode::NOT_FOUND, "File not found"),
        ServiceError::StorageWriteFailed(StorageError::TooLarge) => {
            (StatusCode::PAYLOAD_TOO_LARGE, "File too large")
        }
        ServiceError::StorageWriteFailed(_) | ServiceError::DuplicateCheckFailed(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, "Error uploading file")
        }
        ServiceError::MetadataWriteFailed(_) => {
            (StatusCode::NOT_FOUND, "Error occurred while saving the file")
        }
        ServiceError::MetadataReadFailed(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to retrieve files")
        }
        ServiceError::StorageReadFailed(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to read file")
        }
        ServiceError::StorageDeleteFailed(_) | ServiceError::Internal(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        }
    };
    (status, message.to_owned())
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();
        let operator_facing = status.is_server_error()
            || matches!(self, Self::Service(ServiceError::MetadataWriteFailed(_)));
        if operator_facing {
            tracing::error!(error = %self, status = status.as_u16(), "request failed");
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "request rejected");
        }

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MetadataError;

    #[test]
    fn maps_service_errors_to_status_codes() {
        let cases = [
            (ServiceError::BadRequest("x".into()), StatusCode::BAD_REQUEST),
            (
                ServiceError::DuplicateName { filename: "a.pdf".into() },
                StatusCode::BAD_REQUEST,
            ),
            (ServiceError::NotFound("id".into()), StatusCode::NOT_FOUND),
            (
                ServiceError::StorageWriteFailed(StorageError::stream("reset")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                ServiceError::StorageWriteFailed(StorageError::TooLarge),
                StatusCode::PAYLOAD_TOO_LARGE,
            ),
            (
                ServiceError::MetadataWriteFailed(MetadataError::Io(std::io::Error::other("disk"))),
                StatusCode::NOT_FOUND,
            ),
            (
                ServiceError::DuplicateCheckFailed(MetadataError::Io(std::io::Error::other("disk"))),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (ServiceError::Internal("boom".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, expected) in cases {
            assert_eq!(ApiError::from(err).status_and_message().0, expected);
        }
    }

    #[test]
    fn internal_details_are_not_exposed() {
        let err = ApiError::from(ServiceError::StorageWriteFailed(StorageError::stream(
            "connection reset by peer at /var/lib/pdfshelf",
        )));
        let (_, message) = err.status_and_message();
        assert_eq!(message, "Error uploading file");
    }

    #[test]
    fn multipart_failures_use_fixed_messages() {
        assert_eq!(
            multipart_status(StatusCode::PAYLOAD_TOO_LARGE),
            (StatusCode::PAYLOAD_TOO_LARGE, "File too large".to_owned())
        );
        assert_eq!(
            multipart_status(StatusCode::BAD_REQUEST),
            (StatusCode::BAD_REQUEST, "No file uploaded".to_owned())
        );
        assert_eq!(
            multipart_status(StatusCode::INTERNAL_SERVER_ERROR),
            (StatusCode::INTERNAL_SERVER_ERROR, "Error uploading file".to_owned())
        );
    }

    #[test]
    fn failed_duplicate_check_reads_as_upload_error() {
        let err = ApiError::from(ServiceError::DuplicateCheckFailed(MetadataError::Io(
            std::io::Error::other("catalog locked"),
        )));
        assert_eq!(
            err.status_and_message(),
            (StatusCode::INTERNAL_SERVER_ERROR, "Error uploading file".to_owned())
        );
    }
}
