//! Reverse proxy that keeps the last known-good response per request.
//!
//! Requests whose path embeds an absolute URI (`/https://host/path`) are
//! forwarded to that URI. Upstream responses with status 200 and a valid body
//! are snapshotted to a cache; non-200 or invalid responses are replaced by
//! the cached snapshot for the same request when one exists.

pub mod cache;
pub mod config;
pub mod error;
pub mod metrics;
pub mod proxy;
pub mod resolver;
pub mod snapshot;
pub mod validity;

pub use cache::{CacheKey, CacheStore, FileCacheStore, InMemoryCacheStore};
pub use config::Config;
pub use error::{CacheError, ProxyError};
pub use proxy::{Interception, ProxyController, ProxyServer};
pub use resolver::TargetResolver;
pub use snapshot::Snapshot;
pub use validity::{ResponseValidator, ValidoFlagValidator, Validity};
