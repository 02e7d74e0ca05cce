//! Configuration loading from the process environment.

use std::time::Duration;
use thiserror::Error;

use crate::config::schema::{GatewayConfig, LogFormat};
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}: {reason}")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from the process environment.
pub fn load_from_env() -> Result<GatewayConfig, ConfigError> {
    load_from(|key| std::env::var(key).ok())
}

/// Load and validate configuration from an arbitrary variable lookup.
///
/// Unset and empty variables both fall back to the default.
pub fn load_from<F>(lookup: F) -> Result<GatewayConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let env = EnvSource { lookup };
    let mut config = GatewayConfig::default();

    if let Some(host) = env.get("BIND_HOST") {
        config.listener.bind_host = host;
    }
    if let Some(port) = env.parse::<u16>("PORT")? {
        config.listener.port = port;
    }

    if let Some(bytes) = env.parse::<u64>("MAX_REQUEST_SIZE")? {
        config.limits.max_response_bytes = bytes;
    }
    if let Some(timeout) = env.duration("REQUEST_TIMEOUT")? {
        config.limits.request_timeout = timeout;
    }
    if let Some(redirects) = env.parse::<usize>("MAX_REDIRECTS")? {
        config.limits.max_redirects = redirects;
    }

    if let Some(origins) = env.list("ALLOWED_ORIGINS") {
        config.cors.allowed_origins = origins;
    }
    if let Some(blocked) = env.list("BLOCKED_HOSTS") {
        config.hosts.blocked = blocked;
    }
    if let Some(allowed) = env.list("ALLOWED_HOSTS") {
        config.hosts.allowed = allowed;
    }

    if let Some(limit) = env.parse::<u32>("RATE_LIMIT_PER_MINUTE")? {
        config.rate_limit.requests_per_minute = limit;
    }
    if let Some(interval) = env.duration("RATE_LIMIT_SWEEP_INTERVAL")? {
        config.rate_limit.sweep_interval = interval;
    }

    if let Some(flag) = env.get("VERBOSE_LOGGING") {
        config.observability.verbose = matches!(flag.as_str(), "true" | "1" | "yes");
    }
    if let Some(format) = env.get("LOG_FORMAT") {
        config.observability.log_format = match format.to_ascii_lowercase().as_str() {
            "pretty" => LogFormat::Pretty,
            "json" => LogFormat::Json,
            _ => {
                return Err(ConfigError::InvalidValue {
                    key: "LOG_FORMAT",
                    value: format,
                    reason: "expected 'pretty' or 'json'".to_string(),
                })
            }
        };
    }
    if let Some(addr) = env.get("METRICS_ADDRESS") {
        config.observability.metrics_address = Some(addr);
    }

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

struct EnvSource<F> {
    lookup: F,
}

impl<F> EnvSource<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn get(&self, key: &str) -> Option<String> {
        (self.lookup)(key).filter(|v| !v.is_empty())
    }

    fn parse<T>(&self, key: &'static str) -> Result<Option<T>, ConfigError>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        let Some(raw) = self.get(key) else {
            return Ok(None);
        };
        raw.trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::InvalidValue {
                key,
                value: raw.clone(),
                reason: e.to_string(),
            })
    }

    fn duration(&self, key: &'static str) -> Result<Option<Duration>, ConfigError> {
        let Some(raw) = self.get(key) else {
            return Ok(None);
        };
        humantime::parse_duration(raw.trim())
            .map(Some)
            .map_err(|e| ConfigError::InvalidValue {
                key,
                value: raw.clone(),
                reason: e.to_string(),
            })
    }

    /// Comma-separated list with entries trimmed and empty entries dropped.
    fn list(&self, key: &str) -> Option<Vec<String>> {
        self.get(key).map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .map(str::to_string)
                .collect()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<GatewayConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        load_from(move |key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.listener.port, 8080);
        assert_eq!(config.limits.max_response_bytes, 10 * 1024 * 1024);
        assert_eq!(config.limits.request_timeout, Duration::from_secs(30));
        assert_eq!(config.limits.max_redirects, 10);
        assert_eq!(config.cors.allowed_origins, vec!["*"]);
        assert!(config.hosts.blocked.is_empty());
        assert!(config.hosts.allowed.is_empty());
        assert!(!config.observability.verbose);
        assert!(!config.rate_limit.enabled());
    }

    #[test]
    fn test_lists_are_trimmed() {
        let config = load(&[
            ("ALLOWED_ORIGINS", " https://a.test , ,https://b.test"),
            ("BLOCKED_HOSTS", "localhost,127.0.0.1"),
        ])
        .unwrap();
        assert_eq!(config.cors.allowed_origins, vec!["https://a.test", "https://b.test"]);
        assert_eq!(config.hosts.blocked, vec!["localhost", "127.0.0.1"]);
    }

    #[test]
    fn test_empty_value_uses_default() {
        let config = load(&[("PORT", ""), ("ALLOWED_ORIGINS", "")]).unwrap();
        assert_eq!(config.listener.port, 8080);
        assert!(config.cors.is_wildcard());
    }

    #[test]
    fn test_blank_origin_list_resolves_to_wildcard() {
        let config = load(&[("ALLOWED_ORIGINS", " , ")]).unwrap();
        assert!(config.cors.allowed_origins.is_empty());

        let resolver = crate::security::OriginResolver::new(&config.cors);
        assert_eq!(resolver.resolve(None).as_str(), "*");
        assert_eq!(resolver.resolve(Some("https://any.test")).as_str(), "*");
    }

    #[test]
    fn test_durations_and_flags() {
        let config = load(&[
            ("REQUEST_TIMEOUT", "1m30s"),
            ("VERBOSE_LOGGING", "yes"),
            ("RATE_LIMIT_PER_MINUTE", "60"),
            ("LOG_FORMAT", "JSON"),
        ])
        .unwrap();
        assert_eq!(config.limits.request_timeout, Duration::from_secs(90));
        assert!(config.observability.verbose);
        assert_eq!(config.rate_limit.requests_per_minute, 60);
        assert_eq!(config.observability.log_format, LogFormat::Json);

        let config = load(&[("VERBOSE_LOGGING", "on")]).unwrap();
        assert!(!config.observability.verbose);
    }

    #[test]
    fn test_invalid_number_is_rejected() {
        let err = load(&[("MAX_REDIRECTS", "ten")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: "MAX_REDIRECTS", .. }));
    }

    #[test]
    fn test_zero_timeout_fails_validation() {
        let err = load(&[("REQUEST_TIMEOUT", "0s")]).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }
}
