//! Maps an inbound request path to the upstream URI embedded in it.
//!
//! A path such as `/https://example.com/api/data` targets
//! `https://example.com/api/data`: when the path starts with `/http`, the
//! remainder after the leading slash is parsed as an absolute URI. The match
//! is a plain character prefix, not segment aware, so `/httpbin` also
//! matches (and then fails to parse).

use crate::error::ProxyError;
use hyper::Uri;

/// Paths starting with this prefix are proxied.
pub const PROXY_PREFIX: &str = "/http";

#[derive(Debug, Clone, Default)]
pub struct TargetResolver {
    allowed_hosts: Vec<String>,
}

impl TargetResolver {
    /// Resolver that honors any absolute target.
    pub fn permissive() -> Self {
        Self::default()
    }

    /// Resolver restricted to the given hosts. An empty list is permissive.
    pub fn with_allowed_hosts(allowed_hosts: Vec<String>) -> Self {
        Self {
            allowed_hosts: allowed_hosts
                .into_iter()
                .map(|h| h.to_ascii_lowercase())
                .collect(),
        }
    }

    /// Resolve the target for `path`.
    ///
    /// Returns `Ok(None)` when the path isn't a proxy path. Once the prefix
    /// matches, a remainder that isn't an absolute URI (or names a host
    /// outside the allow-list) is an error rather than a pass-through.
    pub fn resolve(&self, path: &str) -> Result<Option<Uri>, ProxyError> {
        if !path.starts_with(PROXY_PREFIX) {
            return Ok(None);
        }

        let target = &path[1..];
        let uri: Uri = target.parse().map_err(|e: hyper::http::uri::InvalidUri| {
            ProxyError::InvalidTarget {
                target: target.to_string(),
                reason: e.to_string(),
            }
        })?;

        let host = match (uri.scheme(), uri.host()) {
            (Some(_), Some(host)) if !host.is_empty() => host.to_ascii_lowercase(),
            _ => {
                return Err(ProxyError::InvalidTarget {
                    target: target.to_string(),
                    reason: "not an absolute URI".to_string(),
                })
            }
        };

        if !self.is_allowed(&host) {
            return Err(ProxyError::TargetNotAllowed(host));
        }

        Ok(Some(uri))
    }

    fn is_allowed(&self, host: &str) -> bool {
        if self.allowed_hosts.is_empty() {
            return true;
        }
        self.allowed_hosts.iter().any(|allowed| {
            match allowed.strip_prefix("*.") {
                Some(domain) => host
                    .strip_suffix(domain)
                    .is_some_and(|sub| sub.ends_with('.') && sub.len() > 1),
                None => allowed == host,
            }
        })
    }
}
