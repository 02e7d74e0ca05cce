//! Shared utilities for end-to-end tests: a mock upstream and a gateway
//! running on ephemeral ports.

#![allow(dead_code)]

use axum::{
    body::{Body, Bytes},
    extract::Path,
    http::{header, HeaderMap, Method, StatusCode},
    response::{IntoResponse, Redirect, Response},
    routing::{any, get},
    Json, Router,
};
use cors_gateway::{GatewayConfig, HttpServer, Shutdown};
use futures_util::{stream, StreamExt};
use serde_json::json;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;

pub const UPSTREAM_BODY: &str = "Hello from the pretend website!";

/// A gateway serving on `127.0.0.1` until dropped.
pub struct TestGateway {
    pub addr: SocketAddr,
    shutdown: Shutdown,
}

impl TestGateway {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for TestGateway {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Start a gateway with the given config on an ephemeral port.
pub async fn start_gateway(config: GatewayConfig) -> TestGateway {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = HttpServer::new(config).unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    TestGateway { addr, shutdown }
}

/// Start the mock upstream and return its base URL (`http://127.0.0.1:port`).
///
/// Routes:
/// - `/` fixed body plus headers the gateway must relay or override
/// - `/echo` JSON description of the request as received
/// - `/hop/{n}` redirects `n` times before answering
/// - `/large/{n}` body of `n` bytes
/// - `/status/{code}` empty body with the given status
/// - `/slow` answers after two seconds
/// - `/broken` sends 100 bytes, then fails the body
pub async fn start_upstream() -> String {
    let app = Router::new()
        .route("/", get(root))
        .route("/echo", any(echo))
        .route("/hop/{n}", get(hop))
        .route("/large/{n}", get(large))
        .route("/status/{code}", any(status))
        .route("/slow", get(slow))
        .route("/broken", get(broken));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}", addr)
}

/// Client that talks to the gateway directly.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

async fn root() -> Response {
    (
        [
            ("x-upstream", "yes"),
            ("access-control-allow-origin", "https://upstream.invalid"),
        ],
        UPSTREAM_BODY,
    )
        .into_response()
}

async fn echo(method: Method, headers: HeaderMap, body: Bytes) -> Json<serde_json::Value> {
    let lookup = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    Json(json!({
        "method": method.as_str(),
        "host": lookup(header::HOST.as_str()),
        "custom": lookup("x-custom"),
        "body": String::from_utf8_lossy(&body),
    }))
}

async fn hop(Path(n): Path<u32>) -> Response {
    if n == 0 {
        "arrived".into_response()
    } else {
        Redirect::temporary(&format!("/hop/{}", n - 1)).into_response()
    }
}

async fn large(Path(n): Path<usize>) -> Vec<u8> {
    vec![b'x'; n]
}

async fn status(Path(code): Path<u16>) -> StatusCode {
    StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

async fn slow() -> &'static str {
    tokio::time::sleep(Duration::from_secs(2)).await;
    "too late"
}

async fn broken() -> Body {
    let first = stream::once(async { Ok::<_, std::io::Error>(Bytes::from(vec![b'x'; 100])) });
    let failure = stream::once(async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        Err::<Bytes, _>(std::io::Error::other("upstream gave up"))
    });
    Body::from_stream(first.chain(failure))
}
