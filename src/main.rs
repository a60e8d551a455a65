//! `pdfshelf` server binary: loads configuration, installs logging and
//! serves the PDF routes until Ctrl-C or SIGTERM.

use std::{path::PathBuf, sync::Arc};

use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;

use pdfshelf::{api, backend, config::AppConfig, telemetry, StorageBackend};

/// PDF upload and streaming server.
#[derive(Parser, Debug)]
#[command(name = "pdfshelf", about = "Upload, list, stream and delete PDF documents")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, env = "PDFSHELF_CONFIG", default_value = "pdfshelf.toml")]
    config: PathBuf,

    /// Override the bind host.
    #[arg(long)]
    host: Option<String>,

    /// Override the bind port.
    #[arg(long, env = "PORT")]
    port: Option<u16>,

    /// Store files on disk under this directory.
    #[arg(long, env = "PDFSHELF_DATA_DIR")]
    data_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(&cli.config)?;
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(dir) = cli.data_dir {
        config.storage.backend = StorageBackend::Disk;
        config.storage.path = dir;
    }
    config.validate()?;

    telemetry::init(&config.logging);
    if !cli.config.exists() {
        info!(path = %cli.config.display(), "config file not found, using defaults");
    }

    let files = Arc::new(backend::build_service(&config.storage).await?);
    let app = api::router(files, &config.server)?;

    let listener = TcpListener::bind((config.server.host.as_str(), config.server.port)).await?;
    info!(addr = %listener.local_addr()?, "server is listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for ctrl-c");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    info!("shutdown signal received");
}
