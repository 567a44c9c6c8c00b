//! Cache key generation.

use hyper::{Method, Uri};
use sha2::{Digest, Sha256};
use std::fmt;

/// Fingerprint of an outbound request: SHA-256 over the method, the
/// normalized target URI and the outbound body, as lowercase hex.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn derive(method: &Method, target: &Uri, body: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(method.as_str().as_bytes());
        hasher.update(b" ");
        hasher.update(normalize_target(target).as_bytes());
        // URIs can't contain a raw newline, so the boundary is unambiguous
        hasher.update(b"\n");
        hasher.update(body);
        let hash: String = hasher
            .finalize()
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect();
        Self(hash)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Scheme and host are case-insensitive; everything else is kept verbatim.
fn normalize_target(target: &Uri) -> String {
    let scheme = target
        .scheme_str()
        .map(|s| s.to_ascii_lowercase())
        .unwrap_or_default();
    let authority = match target.authority() {
        Some(authority) => {
            let host = authority.host().to_ascii_lowercase();
            match authority.port_u16() {
                Some(port) => format!("{host}:{port}"),
                None => host,
            }
        }
        None => String::new(),
    };
    let path_and_query = target
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    format!("{scheme}://{authority}{path_and_query}")
}
