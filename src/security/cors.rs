//! CORS origin resolution and response headers.
//!
//! The gateway never rejects a disallowed origin itself. It answers with the
//! first configured origin instead, which the browser will not accept.

use axum::http::{header, HeaderMap, HeaderValue};

use crate::config::{CorsConfig, WILDCARD_ORIGIN};

/// Methods advertised in `Access-Control-Allow-Methods`.
pub const ALLOWED_METHODS: &str = "GET, POST, PUT, DELETE, PATCH, OPTIONS";

/// Preflight cache duration in seconds.
pub const MAX_AGE_SECS: &str = "86400";

/// The `Access-Control-Allow-Origin` value chosen for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowedOrigin(String);

impl AllowedOrigin {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_wildcard(&self) -> bool {
        self.0 == WILDCARD_ORIGIN
    }

    /// Credentials are only allowed alongside a concrete origin.
    pub fn allows_credentials(&self) -> bool {
        !self.is_wildcard()
    }
}

/// Resolves the allowed origin from a static allow-list.
#[derive(Debug, Clone)]
pub struct OriginResolver {
    allowed: Vec<String>,
    wildcard_only: bool,
}

impl OriginResolver {
    pub fn new(config: &CorsConfig) -> Self {
        Self {
            allowed: config.allowed_origins.clone(),
            wildcard_only: config.is_wildcard(),
        }
    }

    /// Pick the origin to emit given the request's `Origin` header, if any.
    pub fn resolve(&self, request_origin: Option<&str>) -> AllowedOrigin {
        if self.wildcard_only {
            return AllowedOrigin(WILDCARD_ORIGIN.to_string());
        }

        let Some(origin) = request_origin else {
            return self.fallback();
        };

        let matched = self
            .allowed
            .iter()
            .any(|allowed| allowed == WILDCARD_ORIGIN || allowed == origin);

        if matched {
            AllowedOrigin(origin.to_string())
        } else {
            self.fallback()
        }
    }

    /// Resolve from request headers. An unreadable `Origin` counts as absent.
    pub fn resolve_headers(&self, headers: &HeaderMap) -> AllowedOrigin {
        let origin = headers
            .get(header::ORIGIN)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty());
        self.resolve(origin)
    }

    fn fallback(&self) -> AllowedOrigin {
        let first = self
            .allowed
            .first()
            .map(String::as_str)
            .unwrap_or(WILDCARD_ORIGIN);
        AllowedOrigin(first.to_string())
    }
}

/// Write the full CORS header set, replacing any existing values.
pub fn apply_cors_headers(headers: &mut HeaderMap, origin: &AllowedOrigin) {
    match HeaderValue::from_str(origin.as_str()) {
        Ok(value) => {
            headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, value);
        }
        Err(_) => {
            tracing::warn!(origin = %origin.as_str(), "Origin is not a valid header value");
        }
    }
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOWED_METHODS),
    );
    headers.insert(header::ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static("*"));
    headers.insert(header::ACCESS_CONTROL_MAX_AGE, HeaderValue::from_static(MAX_AGE_SECS));

    if origin.allows_credentials() {
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
            HeaderValue::from_static("true"),
        );
    } else {
        headers.remove(header::ACCESS_CONTROL_ALLOW_CREDENTIALS);
    }
}
