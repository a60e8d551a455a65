//! Axum request layer.

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{config::ServerConfig, error::ConfigError, service::FileService};

/// Error-to-response mapping.
pub mod error;
/// Endpoint handlers.
pub mod files;

pub use error::ApiError;

/// Name of the multipart field carrying the uploaded file.
pub const UPLOAD_FIELD: &str = "file";

/// Shared handler state.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The file service every handler delegates to.
    pub files: Arc<FileService>,
}

/// Builds the application router with CORS, request tracing and the
/// configured body limit.
pub fn router(files: Arc<FileService>, config: &ServerConfig) -> Result<Router, ConfigError> {
    let cors = match config.cors_origins()? {
        None => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
        Some(origins) => CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any),
    };

    let body_limit = match config.body_limit() {
        Some(limit) => DefaultBodyLimit::max(limit),
        None => DefaultBodyLimit::disable(),
    };

    Ok(Router::new()
        .route("/", get(files::list))
        .route("/upload", post(files::upload))
        .route("/pdf/:file_id", get(files::download))
        .route("/pdf/:file_id/view", get(files::view))
        .route("/pdf/:file_id/delete", delete(files::remove))
        .layer(body_limit)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { files }))
}
