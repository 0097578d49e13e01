use std::sync::Arc;

use axum::{Router, routing::get};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use super::{
    services::{download, health, index},
    state::AppState,
};
use crate::config::Config;
use crate::retrieval::YtDlp;

type AnyError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Routes of the service, with request tracing
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/download", get(download))
        .route("/health", get(health))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

pub async fn run(config: Config) -> Result<(), AnyError> {
    let address = config.server.bind_addr;

    match &config.retriever.cookie_file {
        Some(path) if path.exists() => info!(path = %path.display(), "Using cookie file"),
        Some(path) => warn!(
            path = %path.display(),
            "Cookie file not found, downloads will run without cookies"
        ),
        None => info!("No cookie file configured"),
    }
    if config.retriever.ffmpeg_location.is_none() {
        info!("No ffmpeg location configured, formats that need muxing will fail");
    }

    let retriever = Arc::new(YtDlp::with_args(
        config.retriever.binary.clone(),
        config.retriever.args.clone(),
    ));
    let state = AppState::new(config, retriever);
    let app = build_router(state);

    let listener = TcpListener::bind(address).await?;
    info!(%address, "ytaudio listening");

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        let mut sigterm = signal(SignalKind::terminate())
            .expect("failed to install signal handler");
        sigterm.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
