//! Security subsystem: the gateway's request policies.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → cors.rs (resolve allowed origin, always)
//!     → rate_limit.rs (per-IP admission, when enabled)
//!     → host_filter.rs (target host block/allow lists)
//!     → Pass to forwarding
//! ```
//!
//! # Design Decisions
//! - CORS is resolved first so every response, errors included, carries it
//! - Admission is decided before any network I/O
//! - Block list always wins over allow list

pub mod cors;
pub mod host_filter;
pub mod rate_limit;

pub use cors::{apply_cors_headers, AllowedOrigin, OriginResolver};
pub use host_filter::HostFilter;
pub use rate_limit::RateLimiter;
