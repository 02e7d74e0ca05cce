//! CORS gateway.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request                ┌──────────────────────────────────────────┐
//!     ─────────────────────────────▶│  http::server (request ID, tracing)      │
//!                                   │        │                                 │
//!                                   │        ▼                                 │
//!                                   │  security::cors  (allowed origin)        │
//!                                   │  security::rate_limit (per client IP)    │
//!                                   │  security::host_filter (target host)     │
//!                                   │        │                                 │
//!                                   │        ▼                                 │
//!     Client Response               │  http::forward ── reqwest ──────────────┼──▶ Target
//!     ◀─────────────────────────────│  (CORS overlay, capped body relay)  ◀───┼──
//!                                   └──────────────────────────────────────────┘
//! ```

use cors_gateway::config;
use cors_gateway::lifecycle;
use cors_gateway::observability::logging;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = match config::load_from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {e}");
            std::process::exit(1);
        }
    };

    logging::init_logging(&config.observability);
    tracing::info!("cors-gateway v{} starting", env!("CARGO_PKG_VERSION"));

    lifecycle::run(config).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
