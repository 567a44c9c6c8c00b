//! Per-request orchestration.
//!
//! resolve target → forward → capture snapshot → either store it (status 200
//! and valid body) or fall back to the cached snapshot for the same request
//! fingerprint → replay the chosen snapshot. Any failure along the way yields
//! the empty 500 snapshot; the failure itself only goes to logs and metrics.

use super::client::create_http_client;
use super::forwarding::Forwarder;
use super::writer::write_snapshot;
use crate::cache::{CacheKey, CacheStore, FileCacheStore};
use crate::config::Config;
use crate::error::ProxyError;
use crate::metrics;
use crate::resolver::TargetResolver;
use crate::snapshot::Snapshot;
use crate::validity::{ResponseValidator, ValidoFlagValidator, Validity};
use anyhow::Context;
use http_body_util::{BodyExt, Full};
use hyper::body::{Body, Bytes};
use hyper::{Method, Request, Response, Uri};
use std::fmt::Display;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Outcome of [`ProxyController::intercept`].
pub enum Interception<B> {
    /// The request was proxied; send this response.
    Handled(Response<Full<Bytes>>),
    /// Not a proxy path. The request is handed back untouched.
    PassThrough(Request<B>),
}

/// Where the snapshot sent to the client came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseSource {
    /// Fresh, valid upstream response (and now cached).
    Upstream,
    /// Cached snapshot standing in for a failed or invalid upstream response.
    Cache,
    /// Non-200 or invalid upstream response with nothing cached to replace it.
    UpstreamUnvalidated,
    /// The safe 500 produced after a failure.
    Error,
}

impl ResponseSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseSource::Upstream => "upstream",
            ResponseSource::Cache => "cache",
            ResponseSource::UpstreamUnvalidated => "upstream_unvalidated",
            ResponseSource::Error => "error",
        }
    }
}

pub struct ProxyController {
    resolver: TargetResolver,
    forwarder: Forwarder,
    validator: Arc<dyn ResponseValidator>,
    cache: Arc<dyn CacheStore>,
}

impl ProxyController {
    pub fn new(resolver: TargetResolver, forwarder: Forwarder, cache: Arc<dyn CacheStore>) -> Self {
        Self {
            resolver,
            forwarder,
            validator: Arc::new(ValidoFlagValidator),
            cache,
        }
    }

    /// Build a controller with a file-backed cache from configuration.
    pub fn from_config(config: &Config) -> Result<Self, anyhow::Error> {
        let client = create_http_client(&config.connection_pool, &config.upstream)
            .context("Failed to create upstream HTTP client")?;
        let resolver = TargetResolver::with_allowed_hosts(config.upstream.allowed_hosts.clone());
        let cache = Arc::new(FileCacheStore::from_config(&config.cache));
        Ok(Self::new(resolver, Forwarder::new(client), cache))
    }

    /// Replace the default `Valido` flag check.
    pub fn with_validator(mut self, validator: Arc<dyn ResponseValidator>) -> Self {
        self.validator = validator;
        self
    }

    pub fn cache(&self) -> &Arc<dyn CacheStore> {
        &self.cache
    }

    /// Handle `req` if its path embeds a target, otherwise hand it back.
    pub async fn intercept<B>(&self, req: Request<B>) -> Interception<B>
    where
        B: Body<Data = Bytes> + Send,
        B::Error: Display,
    {
        let method = req.method().clone();
        let result = match self.resolver.resolve(req.uri().path()) {
            Ok(None) => return Interception::PassThrough(req),
            Ok(Some(target)) => self.proxy(target, req).await,
            Err(e) => Err(e),
        };

        let (snapshot, source) = match result {
            Ok(chosen) => chosen,
            Err(e) => {
                error!(
                    kind = e.kind(),
                    "Proxying {} request failed, sending 500: {}", method, e
                );
                metrics::record_upstream_failure(e.kind());
                (Snapshot::internal_error(), ResponseSource::Error)
            }
        };

        metrics::record_request(metrics::method_label(&method), source.as_str());
        debug!(
            "Responding {} from {} for {}",
            snapshot.status,
            source.as_str(),
            method
        );
        Interception::Handled(write_snapshot(snapshot))
    }

    async fn proxy<B>(
        &self,
        target: Uri,
        req: Request<B>,
    ) -> Result<(Snapshot, ResponseSource), ProxyError>
    where
        B: Body<Data = Bytes> + Send,
        B::Error: Display,
    {
        let (parts, body) = req.into_parts();
        let body = body
            .collect()
            .await
            .map_err(|e| ProxyError::InboundBody(e.to_string()))?
            .to_bytes();

        let prepared = self
            .forwarder
            .prepare(&parts.method, &parts.headers, &body, &target)?;
        let upstream = self.forwarder.send(prepared.request).await?;

        Ok(self.settle(&parts.method, &prepared.key, upstream).await)
    }

    /// Choose the snapshot to send for an upstream response.
    ///
    /// A 200 with a valid body is stored under `key` and returned. Anything
    /// else is replaced by the cached snapshot for `key` when one exists, and
    /// returned as-is otherwise. Cache failures never fail the request.
    pub async fn settle(
        &self,
        method: &Method,
        key: &CacheKey,
        upstream: Snapshot,
    ) -> (Snapshot, ResponseSource) {
        if upstream.is_ok() && self.validator.classify(&upstream.body_text()) == Validity::Valid {
            if stores_snapshot(method) {
                self.store(key, &upstream).await;
            }
            return (upstream, ResponseSource::Upstream);
        }

        match self.cache.read(key).await {
            Ok(Some(cached)) => {
                metrics::record_cache_op("read", "hit");
                debug!(
                    "Upstream answered {}, replaying cached snapshot {} ({})",
                    upstream.status, key, cached.status
                );
                (cached, ResponseSource::Cache)
            }
            Ok(None) => {
                metrics::record_cache_op("read", "miss");
                (upstream, ResponseSource::UpstreamUnvalidated)
            }
            Err(e) => {
                metrics::record_cache_op("read", e.kind());
                warn!("Ignoring unreadable cache entry {}: {}", key, e);
                (upstream, ResponseSource::UpstreamUnvalidated)
            }
        }
    }

    async fn store(&self, key: &CacheKey, snapshot: &Snapshot) {
        let cache = Arc::clone(&self.cache);
        let key = key.clone();
        let snapshot = snapshot.clone();

        // Spawned so the write completes even if the client disconnects and
        // this request's future is dropped.
        let write = tokio::spawn(async move {
            let result = cache.write(&key, &snapshot).await;
            (key, result)
        });

        match write.await {
            Ok((_, Ok(()))) => metrics::record_cache_op("write", "stored"),
            Ok((key, Err(e))) => {
                metrics::record_cache_op("write", "error");
                warn!("Failed to store snapshot {}: {}", key, e);
            }
            Err(e) => {
                metrics::record_cache_op("write", "error");
                warn!("Cache write task failed: {}", e);
            }
        }
    }
}

/// HEAD responses carry no body, so they never become a replayable snapshot.
fn stores_snapshot(method: &Method) -> bool {
    *method != Method::HEAD
}
