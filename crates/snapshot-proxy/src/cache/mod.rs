//! Last known-good snapshot cache.
//!
//! Entries live in a flat namespace keyed by [`CacheKey`], with no expiry and
//! no size bound. A write replaces the previous entry for its key.
//!
//! # Module Structure
//!
//! - `key` - request fingerprinting
//! - `record` - persisted record format
//! - `file` - directory-backed store (atomic replace, striped writer locks)
//! - `memory` - in-process store

mod file;
mod key;
mod memory;
mod record;

pub use file::FileCacheStore;
pub use key::CacheKey;
pub use memory::InMemoryCacheStore;
pub use record::CacheRecord;

use crate::error::CacheError;
use crate::snapshot::Snapshot;
use async_trait::async_trait;

/// Storage for the last known-good snapshot of each request fingerprint.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Fetch the snapshot stored under `key`, if any.
    async fn read(&self, key: &CacheKey) -> Result<Option<Snapshot>, CacheError>;

    /// Store `snapshot` under `key`, replacing any previous entry.
    async fn write(&self, key: &CacheKey, snapshot: &Snapshot) -> Result<(), CacheError>;

    fn name(&self) -> &'static str;
}
