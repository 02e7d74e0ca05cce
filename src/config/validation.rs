//! Configuration validation.
//!
//! Semantic checks that parsing alone cannot express. All errors are
//! collected rather than stopping at the first.

use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::GatewayConfig;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("request timeout must be greater than zero")]
    ZeroTimeout,

    #[error("maximum response size must be greater than zero")]
    ZeroResponseLimit,

    #[error("rate limit sweep interval must be greater than zero")]
    ZeroSweepInterval,

    #[error("metrics address {0:?} is not a socket address")]
    MetricsAddress(String),
}

pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.limits.request_timeout.is_zero() {
        errors.push(ValidationError::ZeroTimeout);
    }
    if config.limits.max_response_bytes == 0 {
        errors.push(ValidationError::ZeroResponseLimit);
    }
    if config.rate_limit.sweep_interval.is_zero() {
        errors.push(ValidationError::ZeroSweepInterval);
    }
    if let Some(addr) = &config.observability.metrics_address {
        if addr.parse::<SocketAddr>().is_err() {
            errors.push(ValidationError::MetricsAddress(addr.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
