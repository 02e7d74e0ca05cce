//! The forwarding engine.
//!
//! One inbound request becomes at most one outbound call:
//!
//! ```text
//! resolve CORS origin
//!     → OPTIONS? respond 200
//!     → rate limit (if enabled)
//!     → url parameter present, http(s) scheme
//!     → host filter
//!     → outbound call (timeout, redirect ceiling)
//!     → relay status, headers and capped body
//! CORS headers are applied to whichever response comes out.
//! ```

use axum::{
    body::{Body, HttpBody},
    extract::{ConnectInfo, State},
    http::{header, request::Parts, Method, Request, StatusCode},
    response::{IntoResponse, Response},
};
use std::net::SocketAddr;
use std::time::Instant;
use url::Url;

use crate::http::request::{client_ip, request_id, target_url};
use crate::http::response::{CappedBody, GatewayError, UpstreamError};
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::security::apply_cors_headers;

/// Handler for every path except `/health`.
pub async fn forward_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start = Instant::now();
    // Resolved once; the same value goes on every response for this request.
    let allowed_origin = state.origins.resolve_headers(request.headers());
    let method = request.method().clone();

    let mut response = if method == Method::OPTIONS {
        StatusCode::OK.into_response()
    } else {
        match forward(&state, request).await {
            Ok(response) => response,
            Err(err) => err.into_response(),
        }
    };

    apply_cors_headers(response.headers_mut(), &allowed_origin);
    metrics::record_request(method.as_str(), response.status().as_u16(), start);
    response
}

async fn forward(state: &AppState, request: Request<Body>) -> Result<Response, GatewayError> {
    let (parts, body) = request.into_parts();
    let request_id = request_id(&parts.headers).to_string();
    let verbose = state.config.observability.verbose;

    if let Some(limiter) = &state.rate_limiter {
        let ip = client_ip(&parts.headers, peer_addr(&parts));
        if !limiter.admit(&ip) {
            tracing::warn!(request_id = %request_id, client_ip = %ip, limit = limiter.limit(), "Rate limit exceeded");
            return Err(GatewayError::RateLimited);
        }
    }

    let target = target_url(parts.uri.query()).ok_or(GatewayError::MissingUrl)?;

    if !target.starts_with("http://") && !target.starts_with("https://") {
        return Err(GatewayError::InvalidScheme);
    }

    if !state.host_filter.is_allowed(&target) {
        if verbose {
            tracing::info!(request_id = %request_id, target = %target, "Blocked request to disallowed host");
        }
        return Err(GatewayError::HostNotAllowed);
    }

    let url = Url::parse(&target).map_err(|e| GatewayError::InvalidUrl(e.to_string()))?;

    // Host is re-derived from the target URL by the client.
    let mut headers = parts.headers.clone();
    headers.remove(header::HOST);

    let mut outbound = state
        .client
        .request(parts.method.clone(), url)
        .headers(headers);

    // A streamed body cannot be replayed on 307/308, so known-empty bodies
    // are not attached at all.
    if body.size_hint().exact() != Some(0) {
        outbound = outbound.body(reqwest::Body::wrap_stream(body.into_data_stream()));
    }

    tracing::debug!(request_id = %request_id, method = %parts.method, target = %target, "Forwarding request");

    let upstream = outbound.send().await.map_err(|e| {
        let err = UpstreamError::from(e);
        if verbose {
            tracing::warn!(request_id = %request_id, target = %target, error = %err, "Error fetching URL");
        } else {
            tracing::debug!(request_id = %request_id, target = %target, error = %err, "Error fetching URL");
        }
        GatewayError::Upstream(err)
    })?;

    let status = upstream.status();
    let max_bytes = state.config.limits.max_response_bytes;
    let mut upstream_headers = upstream.headers().clone();

    // A declared length past the cap would make the truncated body look like
    // a broken connection; without it the relay just ends early.
    if upstream.content_length().is_some_and(|len| len > max_bytes) {
        upstream_headers.remove(header::CONTENT_LENGTH);
    }

    let method = parts.method;
    let on_complete = Box::new(move |bytes: u64| {
        if verbose {
            tracing::info!(
                request_id = %request_id,
                method = %method,
                target = %target,
                status = status.as_u16(),
                bytes,
                "Forwarded request"
            );
        }
    });
    let body = CappedBody::new(upstream.bytes_stream(), max_bytes, on_complete);

    let mut response = Response::new(Body::from_stream(body));
    *response.headers_mut() = upstream_headers;
    *response.status_mut() = status;
    Ok(response)
}

fn peer_addr(parts: &Parts) -> Option<SocketAddr> {
    parts
        .extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr)
}
