mod config;
mod error;
mod handlers;

use anyhow::{Context, Result};
use ingest::DocumentReader;
use monitor::{IngestionService, StartOutcome};
use std::sync::Arc;
use summarize::OllamaSummarizer;
use tracing_subscriber::EnvFilter;

use crate::config::{AppConfig, LoggingConfig};
use crate::handlers::AppState;

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load().context("Failed to load configuration")?;
    init_tracing(&config.logging);

    // Summarization backend
    let backend = OllamaSummarizer::new(config.ollama_config())?;
    tracing::info!(
        base_url = %config.summarizer.base_url,
        model = backend.model(),
        max_chunk_chars = config.summarizer.max_chunk_chars,
        "Using Ollama summarizer"
    );

    let service = Arc::new(IngestionService::new(
        config.service_config(),
        Arc::new(DocumentReader),
        Arc::new(backend),
    ));
    service.load_ledger().await;

    if config.watcher.autostart {
        match service.start_monitoring().await? {
            StartOutcome::Started => {}
            StartOutcome::AlreadyRunning | StartOutcome::Stopping => {
                tracing::warn!("Monitoring was already active")
            }
        }
    }

    let state = AppState {
        service: service.clone(),
    };
    let app = handlers::router(state, config.server.max_upload_mb * 1024 * 1024);

    let listener = tokio::net::TcpListener::bind(&config.server.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.bind_addr))?;

    tracing::info!("Server listening on http://{}", config.server.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    service.stop_monitoring().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
