//! CORS gateway library.
//!
//! Forwards `/?url=<target>` requests to the target and relays the response
//! with CORS headers, behind origin, rate-limit and host policies.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod security;

pub use config::GatewayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
