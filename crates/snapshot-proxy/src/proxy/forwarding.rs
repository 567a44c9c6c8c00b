//! Request forwarding to the resolved upstream.
//!
//! The inbound body is fully buffered before forwarding. Methods that carry a
//! body upstream get it re-encoded as UTF-8 text with a JSON content type;
//! GET, HEAD, DELETE and TRACE never forward a body.

use super::client::HttpClient;
use super::headers::{is_content_header, split_headers, JSON_UTF8};
use crate::cache::CacheKey;
use crate::error::ProxyError;
use crate::metrics;
use crate::snapshot::Snapshot;
use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::header::{self, HeaderMap, HeaderValue};
use hyper::{Method, Request, StatusCode, Uri};
use std::time::Instant;
use tracing::debug;

/// Whether requests with this method forward their body upstream.
pub fn forwards_body(method: &Method) -> bool {
    !matches!(
        *method,
        Method::GET | Method::HEAD | Method::DELETE | Method::TRACE
    )
}

/// An upstream request ready to send, with the fingerprint of what it sends.
#[derive(Debug)]
pub struct PreparedRequest {
    pub request: Request<Full<Bytes>>,
    pub key: CacheKey,
}

/// Builds upstream requests and drains their responses into snapshots.
#[derive(Clone)]
pub struct Forwarder {
    client: HttpClient,
}

impl Forwarder {
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }

    /// Build the upstream request for an inbound request.
    ///
    /// Standard and extension methods alike are forwarded as-is. Inbound
    /// headers are copied except those describing the body (the rebuilt body
    /// owns them) and `Host`, which always names the target's host.
    pub fn prepare(
        &self,
        method: &Method,
        headers: &HeaderMap,
        body: &[u8],
        target: &Uri,
    ) -> Result<PreparedRequest, ProxyError> {
        let body = if forwards_body(method) {
            Bytes::from(String::from_utf8_lossy(body).into_owned())
        } else {
            Bytes::new()
        };

        let mut builder = Request::builder().method(method.clone()).uri(target.clone());

        if let Some(outbound) = builder.headers_mut() {
            if forwards_body(method) {
                outbound.insert(header::CONTENT_TYPE, JSON_UTF8.clone());
            }

            for (name, value) in headers.iter() {
                if is_content_header(name) || name == header::TRANSFER_ENCODING || name == header::HOST
                {
                    continue;
                }
                outbound.append(name.clone(), value.clone());
            }

            if let Some(host) = target.host() {
                let host = HeaderValue::from_str(host).map_err(|e| ProxyError::InvalidTarget {
                    target: target.to_string(),
                    reason: e.to_string(),
                })?;
                outbound.insert(header::HOST, host);
            }
        }

        let key = CacheKey::derive(method, target, &body);
        let request = builder.body(Full::new(body))?;

        Ok(PreparedRequest { request, key })
    }

    /// Send the request and drain the full response into a snapshot.
    ///
    /// Dropping the returned future cancels the upstream exchange.
    pub async fn send(&self, request: Request<Full<Bytes>>) -> Result<Snapshot, ProxyError> {
        let method = request.method().clone();
        let start = Instant::now();

        debug!("Forwarding {} {}", method, request.uri());

        let response = self.client.request(request).await?;
        let (parts, body) = response.into_parts();
        let body = body.collect().await?.to_bytes();

        let duration_ms = start.elapsed().as_secs_f64() * 1000.0;
        metrics::record_upstream_duration(
            metrics::method_label(&method),
            parts.status.as_u16(),
            duration_ms,
        );

        Ok(capture_snapshot(parts.status, &parts.headers, body))
    }
}

/// Capture a drained upstream response.
pub fn capture_snapshot(status: StatusCode, headers: &HeaderMap, body: Bytes) -> Snapshot {
    let (message_headers, content_headers) = split_headers(headers);
    let mut snapshot = Snapshot::new(status.as_u16()).with_body(body);
    snapshot.headers = message_headers;
    snapshot.content_headers = content_headers;
    snapshot
}
