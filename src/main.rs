use std::sync::Arc;

use tracing_subscriber::EnvFilter;

mod api;
mod config;
mod error;
mod jobs;
mod script;
mod tts;

use api::routes::{create_router, AppState};
use config::Config;
use jobs::{JobRunner, JobStore};
use tts::SimulatedBackend;

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {}", e);
            std::process::exit(2);
        }
    };

    tracing::info!("TTS Job Server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Starting server on http://{}", config.addr);
    tracing::info!(
        "Jobs retained for {}s, swept every {}s",
        config.retention.as_secs(),
        config.sweep_interval.as_secs()
    );

    // The store lives exactly as long as the server.
    let store = Arc::new(JobStore::new(config.retention));
    let sweeper = store.spawn_sweeper(config.sweep_interval);

    let backend = SimulatedBackend::new(
        config.generate_delay,
        config.upload_delay,
        config.audio_base_url.clone(),
    );
    let runner = JobRunner::new(Arc::clone(&store), Arc::new(backend), config.stage_timings());

    let state = Arc::new(AppState { runner });
    let app = create_router(state, &config.static_dir);

    let listener = match tokio::net::TcpListener::bind(config.addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind to {}: {}", config.addr, e);
            std::process::exit(1);
        }
    };

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!("Server error: {}", e);
    }

    sweeper.abort();
    if !store.is_empty() {
        tracing::info!("Dropping {} unfinished or retained job(s)", store.len());
    }
    tracing::info!("Server stopped");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
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

    tracing::info!("Shutdown signal received");
}
