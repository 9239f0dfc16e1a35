//! Credential validator service
//!
//! Single-binary Rust service that:
//! 1. Loads the provider catalog and binds every entry to its probe
//! 2. Accepts `POST /validate` with a provider slug and credential map
//! 3. Makes one authenticated probe call against the provider
//! 4. Answers with a normalized validation result

mod api;
mod config;
mod error;
mod metrics;

use anyhow::{Context, Result};
use provider::ReqwestTransport;
use providers::{Catalog, Registry};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api::AppState;
use crate::config::Config;
use crate::metrics::MetricsObserver;

/// How long in-flight validations may run after a shutdown signal.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(35);

#[tokio::main]
async fn main() -> Result<()> {
    // JSON output, filter from LOG_LEVEL then RUST_LOG
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_env("LOG_LEVEL")
                .or_else(|_| EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    info!("starting credential-validator");

    // Install before any metric is emitted
    let prometheus_handle =
        metrics::install_recorder().context("failed to install Prometheus recorder")?;

    let args: Vec<String> = std::env::args().collect();
    let cli_config_path = args
        .iter()
        .position(|a| a == "--config")
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str());

    let config_path = Config::resolve_path(cli_config_path);
    info!(path = %config_path.display(), "loading configuration");

    let config = Config::load(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;

    info!(
        listen_addr = %config.server.listen_addr,
        max_connections = config.server.max_connections,
        timeout_secs = config.validation.timeout_secs,
        connect_timeout_secs = config.validation.connect_timeout_secs,
        "configuration loaded"
    );

    let catalog_path = config.validation.catalog_path.as_deref();
    let catalog = Catalog::load(catalog_path).with_context(|| match catalog_path {
        Some(path) => format!("failed to load provider catalog from {}", path.display()),
        None => "embedded provider catalog is invalid".to_string(),
    })?;

    let transport = ReqwestTransport::new(
        config.validation.timeout(),
        config.validation.connect_timeout(),
    )
    .context("failed to build HTTP client")?;

    let registry = Registry::build(
        catalog,
        Arc::new(transport),
        Arc::new(MetricsObserver::default()),
        config.validation.timeout(),
    )
    .context("failed to bind provider catalog")?;
    info!(providers = registry.len(), "providers registered");

    let app = api::router(
        AppState::new(registry, prometheus_handle),
        config.server.max_connections,
    );

    let listen_addr = config.server.listen_addr;
    let listener = TcpListener::bind(listen_addr)
        .await
        .with_context(|| format!("failed to bind to {listen_addr}"))?;
    info!(addr = %listen_addr, "accepting requests");

    // The drain timer starts at signal receipt, not at server start: the
    // server is told to drain, then the drain races DRAIN_TIMEOUT.
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

    let server_handle = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await
    });

    shutdown_signal().await;
    let _ = shutdown_tx.send(());

    match tokio::time::timeout(DRAIN_TIMEOUT, server_handle).await {
        Ok(Ok(Ok(()))) => info!("all in-flight requests drained"),
        Ok(Ok(Err(e))) => error!(error = %e, "server error during shutdown"),
        Ok(Err(e)) => error!(error = %e, "server task panicked"),
        Err(_) => warn!(
            drain_timeout_secs = DRAIN_TIMEOUT.as_secs(),
            "drain timeout exceeded, forcing shutdown"
        ),
    }

    info!("shutdown complete");
    Ok(())
}

/// Wait for SIGTERM or SIGINT for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for Ctrl+C");
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
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received SIGINT, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}
