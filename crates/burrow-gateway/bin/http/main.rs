mod cli;

use crate::cli::{LogFormat, CLI};
use anyhow::Context;
use burrow_gateway::storage::{build_storage, StorageSettings};
use burrow_gateway::{App, AppState};
use burrow_generator::RandomGenerator;
use burrow_shortener::ShortenerService;
use clap::Parser;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; flags and the real environment still apply.
    let _ = dotenvy::dotenv();

    let config = CLI::parse();
    init_tracing(config.log_format);

    info!(
        server_address = %config.server_address,
        base_url = %config.base_url,
        file_storage = config.file_storage_path().is_some(),
        database = config.database_dsn().is_some(),
        "starting gateway"
    );

    let settings = StorageSettings::builder()
        .file_storage_path(config.file_storage_path())
        .database_dsn(config.database_dsn())
        .build();
    let storage = build_storage(&settings).await;

    let shortener = ShortenerService::new(storage, RandomGenerator::new());
    let state = AppState::new(Arc::new(shortener), config.base_url.clone())
        .with_delete_timeout(config.delete_timeout());

    let listener = TcpListener::bind(&config.server_address)
        .await
        .with_context(|| format!("failed to bind {}", config.server_address))?;
    info!(listen_addr = %listener.local_addr()?, "gateway listening");

    axum::serve(listener, App::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("gateway stopped");
    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("shutdown signal received");
}
