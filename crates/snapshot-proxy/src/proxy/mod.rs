//! Proxy module.
//!
//! This module provides the forwarding layer:
//! - Target resolution from the request path (see [`crate::resolver`])
//! - Request forwarding over a shared connection pool
//! - Snapshotting of valid upstream responses, replay of the cached snapshot
//!   when the upstream fails or answers with an invalid payload
//!
//! # Module Structure
//!
//! - `controller` - Per-request orchestration (`ProxyController`)
//! - `forwarding` - Upstream request building and response capture
//! - `writer` - Snapshot replay onto the client response
//! - `headers` - Header classification helpers
//! - `client` - HTTP client creation and configuration
//! - `tls` - Upstream TLS utilities
//! - `server` - Hosting listener (`ProxyServer`)

mod client;
mod controller;
mod forwarding;
mod headers;
mod server;
mod tls;
mod writer;


pub use client::{create_http_client, HttpClient};
pub use controller::{Interception, ProxyController, ResponseSource};
pub use forwarding::{capture_snapshot, forwards_body, Forwarder, PreparedRequest};
pub use headers::CONTENT_HEADERS;
pub use server::{error_response, ProxyServer};
pub use writer::write_snapshot;
