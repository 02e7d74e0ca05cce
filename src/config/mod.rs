//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! process environment
//!     → loader.rs (read & parse variables)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!     → shared via Arc to the policy components
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; there is no reload
//! - All fields have defaults so an empty environment is a valid config
//! - Unparsable values fail startup instead of silently defaulting

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_from, load_from_env, ConfigError};
pub use schema::{
    CorsConfig, GatewayConfig, HostFilterConfig, LimitsConfig, ListenerConfig, LogFormat,
    ObservabilityConfig, RateLimitConfig, WILDCARD_ORIGIN,
};
