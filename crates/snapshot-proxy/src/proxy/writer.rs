//! Replays a snapshot as the response to the client.

use super::headers::apply_header_values;
use crate::snapshot::Snapshot;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header;
use hyper::{Response, StatusCode};
use tracing::warn;

/// Build the client response for `snapshot`.
///
/// Message headers are applied first, then content headers (which win on a
/// name clash). `transfer-encoding` is always removed: the body is fully
/// buffered and sent with a known length.
pub fn write_snapshot(snapshot: Snapshot) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::new()));

    let headers = response.headers_mut();
    for name in apply_header_values(headers, &snapshot.headers)
        .into_iter()
        .chain(apply_header_values(headers, &snapshot.content_headers))
    {
        warn!("Dropping unrepresentable header '{}' from snapshot", name);
    }
    headers.remove(header::TRANSFER_ENCODING);

    *response.status_mut() = StatusCode::from_u16(snapshot.status).unwrap_or_else(|_| {
        warn!("Snapshot has invalid status {}, sending 500", snapshot.status);
        StatusCode::INTERNAL_SERVER_ERROR
    });

    *response.body_mut() = Full::new(snapshot.into_body());
    response
}
