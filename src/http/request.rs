//! Request inspection helpers.
//!
//! # Responsibilities
//! - Generate a unique request ID (UUID v4)
//! - Derive the client IP used as the rate-limit key
//! - Extract the target URL from the query string

use axum::http::{HeaderMap, HeaderName, HeaderValue, Request};
use std::net::SocketAddr;
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");
pub const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");
pub const X_REAL_IP: HeaderName = HeaderName::from_static("x-real-ip");

/// Generates UUID v4 request IDs for `SetRequestIdLayer`.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidRequestId;

impl MakeRequestId for UuidRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let id = Uuid::new_v4().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

/// Request ID of an inbound request, or `"unknown"`.
pub fn request_id(headers: &HeaderMap) -> &str {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

/// Client IP: first `X-Forwarded-For` entry, then `X-Real-IP`, then the
/// peer address without its port.
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    if let Some(xff) = header_str(headers, &X_FORWARDED_FOR) {
        let first = xff.split(',').next().unwrap_or(xff).trim();
        return first.to_string();
    }
    if let Some(real_ip) = header_str(headers, &X_REAL_IP) {
        return real_ip.to_string();
    }
    peer.map(|addr| addr.ip().to_string()).unwrap_or_default()
}

fn header_str<'a>(headers: &'a HeaderMap, name: &HeaderName) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
}

/// First `url` query parameter, percent-decoded. Empty counts as missing.
pub fn target_url(query: Option<&str>) -> Option<String> {
    let query = query?;
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == "url")
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (k, v) in pairs {
            map.insert(*k, HeaderValue::from_static(v));
        }
        map
    }

    #[test]
    fn test_client_ip_prefers_forwarded_for() {
        let peer: SocketAddr = "192.168.1.1:5000".parse().unwrap();
        let h = headers(&[
            ("x-forwarded-for", " 203.0.113.7 , 10.0.0.1"),
            ("x-real-ip", "198.51.100.2"),
        ]);
        assert_eq!(client_ip(&h, Some(peer)), "203.0.113.7");
    }

    #[test]
    fn test_client_ip_falls_back_to_real_ip() {
        let peer: SocketAddr = "192.168.1.1:5000".parse().unwrap();
        let h = headers(&[("x-real-ip", "198.51.100.2")]);
        assert_eq!(client_ip(&h, Some(peer)), "198.51.100.2");
    }

    #[test]
    fn test_client_ip_strips_peer_port() {
        let peer: SocketAddr = "192.168.1.1:5000".parse().unwrap();
        assert_eq!(client_ip(&HeaderMap::new(), Some(peer)), "192.168.1.1");

        let peer: SocketAddr = "[::1]:5000".parse().unwrap();
        assert_eq!(client_ip(&HeaderMap::new(), Some(peer)), "::1");
    }

    #[test]
    fn test_target_url() {
        assert_eq!(
            target_url(Some("url=https%3A%2F%2Fexample.com%2Fa%3Fb%3D1")).as_deref(),
            Some("https://example.com/a?b=1")
        );
        assert_eq!(
            target_url(Some("x=1&url=https://a.test&url=https://b.test")).as_deref(),
            Some("https://a.test")
        );
        assert_eq!(target_url(Some("url=")), None);
        assert_eq!(target_url(Some("other=1")), None);
        assert_eq!(target_url(None), None);
    }

    #[test]
    fn test_request_id_generation() {
        let req = Request::new(());
        let id = UuidRequestId.make_request_id(&req).unwrap();
        let value = id.header_value().to_str().unwrap();
        assert!(Uuid::parse_str(value).is_ok());
    }
}
