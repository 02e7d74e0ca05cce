//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router with all handlers
//! - Wire up middleware (tracing, request ID)
//! - Build the shared outbound client (timeout, redirect ceiling)
//! - Bind server to listener and drain on shutdown
//! - Run the rate-limit sweeper

use axum::{
    http::StatusCode,
    response::IntoResponse,
    routing::any,
    Json, Router,
};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::SystemTime;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::GatewayConfig;
use crate::http::forward::forward_handler;
use crate::http::request::{UuidRequestId, X_REQUEST_ID};
use crate::http::response::RedirectLimitExceeded;
use crate::security::{HostFilter, OriginResolver, RateLimiter};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GatewayConfig>,
    pub origins: Arc<OriginResolver>,
    pub host_filter: Arc<HostFilter>,
    /// `None` when rate limiting is disabled.
    pub rate_limiter: Option<Arc<RateLimiter>>,
    pub client: reqwest::Client,
}

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
    state: AppState,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: GatewayConfig) -> Result<Self, reqwest::Error> {
        let client = build_client(&config)?;

        let rate_limiter = config
            .rate_limit
            .enabled()
            .then(|| Arc::new(RateLimiter::new(config.rate_limit.requests_per_minute)));

        let state = AppState {
            origins: Arc::new(OriginResolver::new(&config.cors)),
            host_filter: Arc::new(HostFilter::new(&config.hosts)),
            rate_limiter,
            client,
            config: Arc::new(config),
        };

        let router = Self::build_router(state.clone());
        Ok(Self { router, state })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/health", any(health_handler))
            .route("/", any(forward_handler))
            .route("/{*path}", any(forward_handler))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::new(X_REQUEST_ID, UuidRequestId))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::new(X_REQUEST_ID)),
            )
    }

    /// The fully layered router, for serving or in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GatewayConfig {
        &self.state.config
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        if let Some(limiter) = self.state.rate_limiter.clone() {
            let interval = self.state.config.rate_limit.sweep_interval;
            let sweeper_shutdown = shutdown.resubscribe();
            tokio::spawn(async move {
                limiter.run_sweeper(interval, sweeper_shutdown).await;
            });
        }

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(wait_for(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn wait_for(mut shutdown: broadcast::Receiver<()>) {
    // A closed channel means the coordinator is gone; stop as well.
    let _ = shutdown.recv().await;
    tracing::info!("Shutdown signal received, draining connections");
}

fn build_client(config: &GatewayConfig) -> Result<reqwest::Client, reqwest::Error> {
    let max_redirects = config.limits.max_redirects;

    // `previous` holds every URL already requested in the chain, so its
    // length equals the number of the redirect now being considered.
    let redirect_policy = reqwest::redirect::Policy::custom(move |attempt| {
        if attempt.previous().len() > max_redirects {
            attempt.error(RedirectLimitExceeded { limit: max_redirects })
        } else {
            attempt.follow()
        }
    });

    reqwest::Client::builder()
        .timeout(config.limits.request_timeout)
        .redirect(redirect_policy)
        .build()
}

#[derive(Serialize)]
struct HealthStatus {
    status: &'static str,
    timestamp: String,
}

/// Liveness probe.
async fn health_handler() -> impl IntoResponse {
    let timestamp = humantime::format_rfc3339_seconds(SystemTime::now()).to_string();
    (
        StatusCode::OK,
        Json(HealthStatus {
            status: "ok",
            timestamp,
        }),
    )
}

/// Log the effective policy once at startup.
pub fn log_startup_banner(config: &GatewayConfig) {
    tracing::info!(
        address = %config.bind_address(),
        max_response_mb = config.limits.max_response_bytes / (1024 * 1024),
        request_timeout = ?config.limits.request_timeout,
        max_redirects = config.limits.max_redirects,
        "CORS gateway configured"
    );
    tracing::info!("Usage: http://localhost:{}/?url=https://example.com", config.listener.port);

    if config.cors.is_wildcard() {
        tracing::info!("CORS: all origins allowed (*)");
    } else {
        tracing::info!(origins = ?config.cors.allowed_origins, "CORS: specific origins allowed");
    }
    if config.rate_limit.enabled() {
        tracing::info!(per_minute = config.rate_limit.requests_per_minute, "Rate limit enabled per client IP");
    }
    if !config.hosts.allowed.is_empty() {
        tracing::info!(hosts = ?config.hosts.allowed, "Allowed hosts");
    }
    if !config.hosts.blocked.is_empty() {
        tracing::info!(hosts = ?config.hosts.blocked, "Blocked hosts");
    }
}
