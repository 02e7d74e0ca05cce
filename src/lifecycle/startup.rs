//! Startup orchestration.
//!
//! Fail fast: any startup error is fatal. Listeners start last so traffic
//! only arrives once every subsystem is ready.

use std::net::SocketAddr;
use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::GatewayConfig;
use crate::http::server::{log_startup_banner, HttpServer};
use crate::lifecycle::{signals, Shutdown};
use crate::observability::metrics;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to build upstream client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[from] std::io::Error),
}

/// Start every subsystem and serve until a shutdown signal arrives.
pub async fn run(config: GatewayConfig) -> Result<(), StartupError> {
    log_startup_banner(&config);

    if let Some(addr) = &config.observability.metrics_address {
        // Validated at load time.
        if let Ok(addr) = addr.parse::<SocketAddr>() {
            metrics::init_metrics(addr);
        }
    }

    let address = config.bind_address();
    let server = HttpServer::new(config)?;

    let listener = TcpListener::bind(&address)
        .await
        .map_err(|source| StartupError::Bind {
            address: address.clone(),
            source,
        })?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        signals::wait_for_shutdown_signal().await;
        shutdown.trigger();
    });

    server.run(listener, server_shutdown).await?;
    Ok(())
}
