use super::{CacheKey, CacheStore};
use crate::error::CacheError;
use crate::snapshot::Snapshot;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;

/// In-process snapshot cache.
///
/// Entries are lost when the process exits. Useful for embedding the proxy in
/// tests or single-instance deployments that don't need persistence.
#[derive(Default)]
pub struct InMemoryCacheStore {
    entries: RwLock<HashMap<CacheKey, Snapshot>>,
}

impl InMemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[async_trait]
impl CacheStore for InMemoryCacheStore {
    async fn read(&self, key: &CacheKey) -> Result<Option<Snapshot>, CacheError> {
        Ok(self.entries.read().get(key).cloned())
    }

    async fn write(&self, key: &CacheKey, snapshot: &Snapshot) -> Result<(), CacheError> {
        self.entries.write().insert(key.clone(), snapshot.clone());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
