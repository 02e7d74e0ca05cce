//! Response handling: error taxonomy and the capped body relay.
//!
//! # Responsibilities
//! - Map gateway errors to HTTP status codes and JSON bodies
//! - Relay the upstream body to the caller with a byte cap
//! - Record bytes written once the relay finishes
//!
//! # Design Decisions
//! - Streaming responses avoid buffering the entire body
//! - Truncation at the cap is silent to the caller
//! - Upstream failures never leak the raw error chain

use axum::{
    body::Bytes,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use futures_util::Stream;
use serde_json::json;
use std::error::Error as StdError;
use std::pin::Pin;
use std::task::{Context, Poll};
use thiserror::Error;

use crate::observability::metrics;

/// Usage hint returned when the `url` parameter is missing.
pub const MISSING_URL_MESSAGE: &str = "Missing 'url' parameter. Usage: /?url=https://example.com";

/// Every way a forwarded request can fail before the upstream body is relayed.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("{}", MISSING_URL_MESSAGE)]
    MissingUrl,

    #[error("URL must start with http:// or https://")]
    InvalidScheme,

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("This host is not allowed")]
    HostNotAllowed,

    #[error("Rate limit exceeded. Please try again later.")]
    RateLimited,

    #[error("Failed to fetch URL: {0}")]
    Upstream(#[from] UpstreamError),
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::MissingUrl | GatewayError::InvalidScheme | GatewayError::InvalidUrl(_) => {
                StatusCode::BAD_REQUEST
            }
            GatewayError::HostNotAllowed => StatusCode::FORBIDDEN,
            GatewayError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            GatewayError::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// Label used for the rejection metric.
    pub fn reason(&self) -> &'static str {
        match self {
            GatewayError::MissingUrl => "missing_url",
            GatewayError::InvalidScheme => "bad_scheme",
            GatewayError::InvalidUrl(_) => "invalid_url",
            GatewayError::HostNotAllowed => "host_blocked",
            GatewayError::RateLimited => "rate_limit",
            GatewayError::Upstream(_) => "upstream",
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        metrics::record_rejection(self.reason());
        let body = json!({ "error": self.to_string() });
        (self.status(), Json(body)).into_response()
    }
}

/// Sanitized description of an outbound transport failure.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("request timed out")]
    Timeout,

    #[error("too many redirects (limit {limit})")]
    TooManyRedirects { limit: usize },

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("{0}")]
    Request(String),
}

/// Marker error raised by the redirect policy when the ceiling is hit.
#[derive(Debug, Error)]
#[error("too many redirects (limit {limit})")]
pub struct RedirectLimitExceeded {
    pub limit: usize,
}

impl From<reqwest::Error> for UpstreamError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(limit) = find_source::<RedirectLimitExceeded>(&err).map(|e| e.limit) {
            return UpstreamError::TooManyRedirects { limit };
        }
        if err.is_timeout() {
            return UpstreamError::Timeout;
        }
        // reqwest's own Display repeats the URL; the innermost cause is the
        // useful part (e.g. "Connection refused", "dns error").
        let cause = root_cause(&err);
        if err.is_connect() {
            UpstreamError::Connect(cause)
        } else {
            UpstreamError::Request(cause)
        }
    }
}

fn find_source<'a, T: StdError + 'static>(err: &'a (dyn StdError + 'static)) -> Option<&'a T> {
    let mut current: Option<&(dyn StdError + 'static)> = Some(err);
    while let Some(e) = current {
        if let Some(found) = e.downcast_ref::<T>() {
            return Some(found);
        }
        current = e.source();
    }
    None
}

fn root_cause(err: &(dyn StdError + 'static)) -> String {
    let mut current = err;
    while let Some(next) = current.source() {
        current = next;
    }
    current.to_string()
}

type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, reqwest::Error>> + Send>>;

/// Called once with the number of bytes relayed when the body finishes.
pub type OnComplete = Box<dyn FnOnce(u64) + Send>;

/// Upstream body relay that stops after `limit` bytes.
pub struct CappedBody {
    inner: ByteStream,
    remaining: u64,
    written: u64,
    on_complete: Option<OnComplete>,
}

impl CappedBody {
    pub fn new<S>(inner: S, limit: u64, on_complete: OnComplete) -> Self
    where
        S: Stream<Item = Result<Bytes, reqwest::Error>> + Send + 'static,
    {
        Self {
            inner: Box::pin(inner),
            remaining: limit,
            written: 0,
            on_complete: Some(on_complete),
        }
    }

    fn finish(&mut self) {
        if let Some(on_complete) = self.on_complete.take() {
            metrics::record_response_bytes(self.written);
            on_complete(self.written);
        }
    }
}

impl Stream for CappedBody {
    type Item = Result<Bytes, std::io::Error>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.remaining == 0 {
            self.finish();
            return Poll::Ready(None);
        }

        match self.inner.as_mut().poll_next(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(None) => {
                self.finish();
                Poll::Ready(None)
            }
            Poll::Ready(Some(Ok(mut chunk))) => {
                if chunk.len() as u64 > self.remaining {
                    chunk.truncate(self.remaining as usize);
                }
                let len = chunk.len() as u64;
                self.remaining -= len;
                self.written += len;
                if self.remaining == 0 {
                    self.finish();
                }
                Poll::Ready(Some(Ok(chunk)))
            }
            Poll::Ready(Some(Err(e))) => {
                tracing::warn!(written = self.written, error = %root_cause(&e), "Upstream body failed mid-stream");
                // No completion record: the caller sees an aborted connection.
                self.on_complete = None;
                Poll::Ready(Some(Err(std::io::Error::other(UpstreamError::from(e)))))
            }
        }
    }
}

impl Drop for CappedBody {
    fn drop(&mut self) {
        if self.on_complete.is_some() {
            tracing::debug!(written = self.written, "Response body dropped before the upstream finished");
            self.finish();
        }
    }
}
