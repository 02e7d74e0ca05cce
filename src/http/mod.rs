//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, tracing)
//!     → forward.rs (CORS, policies, outbound call)
//!     → request.rs (client IP, target URL)
//!     → response.rs (error bodies, capped relay)
//!     → Send to client
//! ```

pub mod forward;
pub mod request;
pub mod response;
pub mod server;

pub use request::X_REQUEST_ID;
pub use response::{GatewayError, UpstreamError};
pub use server::{AppState, HttpServer};
