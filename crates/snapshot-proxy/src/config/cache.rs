//! Snapshot cache configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    /// Directory holding one record per cache key (default: working directory)
    #[serde(default = "default_cache_dir")]
    pub dir: PathBuf,
    /// Number of writer locks keys are striped across
    #[serde(default = "default_lock_stripes")]
    pub lock_stripes: usize,
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_lock_stripes() -> usize {
    64
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: default_cache_dir(),
            lock_stripes: default_lock_stripes(),
        }
    }
}
