//! Configuration schema definitions.
//!
//! This module defines the complete policy configuration for the gateway.
//! The values are built once at startup and shared read-only afterwards.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Wildcard origin value.
pub const WILDCARD_ORIGIN: &str = "*";

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind host, port).
    pub listener: ListenerConfig,

    /// Response, timeout and redirect limits for outbound calls.
    pub limits: LimitsConfig,

    /// CORS origin allow-list.
    pub cors: CorsConfig,

    /// Target host block/allow lists.
    pub hosts: HostFilterConfig,

    /// Per-client rate limiting.
    pub rate_limit: RateLimitConfig,

    /// Logging and metrics settings.
    pub observability: ObservabilityConfig,
}

impl GatewayConfig {
    /// Address the listener binds to, e.g. `0.0.0.0:8080`.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.listener.bind_host, self.listener.port)
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Interface to bind (e.g., "0.0.0.0").
    pub bind_host: String,

    /// TCP port.
    pub port: u16,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

/// Limits applied to every forwarded call.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum number of response body bytes relayed to the caller.
    pub max_response_bytes: u64,

    /// Timeout covering the full upstream round trip, body included.
    pub request_timeout: Duration,

    /// Maximum redirect hops followed for one outbound call.
    pub max_redirects: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_response_bytes: 10 * 1024 * 1024, // 10 MiB
            request_timeout: Duration::from_secs(30),
            max_redirects: 10,
        }
    }
}

/// CORS configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Ordered list of allowed origins. `["*"]` allows every origin.
    pub allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec![WILDCARD_ORIGIN.to_string()],
        }
    }
}

impl CorsConfig {
    /// True when the allow-list is exactly the single wildcard entry.
    pub fn is_wildcard(&self) -> bool {
        self.allowed_origins.len() == 1 && self.allowed_origins[0] == WILDCARD_ORIGIN
    }
}

/// Host filter configuration.
///
/// Entries are substrings matched anywhere in the target hostname.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct HostFilterConfig {
    /// Hosts that are always rejected.
    pub blocked: Vec<String>,

    /// Hosts that are accepted. Empty allows every non-blocked host.
    pub allowed: Vec<String>,
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Requests admitted per client IP per minute. Zero disables limiting.
    pub requests_per_minute: u32,

    /// How often expired client windows are swept from memory.
    pub sweep_interval: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_minute: 0,
            sweep_interval: Duration::from_secs(60),
        }
    }
}

impl RateLimitConfig {
    pub fn enabled(&self) -> bool {
        self.requests_per_minute > 0
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log every forwarded and blocked request.
    pub verbose: bool,

    /// Log output format.
    pub log_format: LogFormat,

    /// Prometheus exporter bind address. `None` disables the exporter.
    pub metrics_address: Option<String>,
}
