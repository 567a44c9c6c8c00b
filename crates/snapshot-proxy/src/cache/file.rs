//! Directory-backed snapshot cache.
//!
//! Each key maps to `<dir>/<key>.dat`. Writers hold a striped per-key lock,
//! write a uniquely named temp file in the same directory, sync it and rename
//! it over the entry, so readers (which take no lock) only ever see a
//! complete record.

use super::{CacheKey, CacheRecord, CacheStore};
use crate::config::CacheConfig;
use crate::error::CacheError;
use crate::snapshot::Snapshot;
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, trace, warn};

const ENTRY_EXTENSION: &str = "dat";

pub struct FileCacheStore {
    dir: PathBuf,
    write_locks: Vec<Mutex<()>>,
    temp_counter: AtomicU64,
}

impl FileCacheStore {
    pub fn new(dir: impl Into<PathBuf>, lock_stripes: usize) -> Self {
        let write_locks = (0..lock_stripes.max(1)).map(|_| Mutex::new(())).collect();
        Self {
            dir: dir.into(),
            write_locks,
            temp_counter: AtomicU64::new(0),
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.dir.clone(), config.lock_stripes)
    }

    pub fn entry_path(&self, key: &CacheKey) -> PathBuf {
        self.dir.join(format!("{key}.{ENTRY_EXTENSION}"))
    }

    fn temp_path(&self, key: &CacheKey) -> PathBuf {
        let n = self.temp_counter.fetch_add(1, Ordering::Relaxed);
        self.dir
            .join(format!(".{key}.{}.{n}.tmp", std::process::id()))
    }

    fn write_lock(&self, key: &CacheKey) -> &Mutex<()> {
        let stripe = key
            .as_str()
            .bytes()
            .take(16)
            .fold(0usize, |acc, b| acc.wrapping_mul(31).wrapping_add(b as usize));
        &self.write_locks[stripe % self.write_locks.len()]
    }

    async fn write_temp(path: &Path, data: &[u8]) -> std::io::Result<()> {
        let mut file = fs::File::create(path).await?;
        file.write_all(data).await?;
        file.sync_all().await?;
        Ok(())
    }
}

#[async_trait]
impl CacheStore for FileCacheStore {
    async fn read(&self, key: &CacheKey) -> Result<Option<Snapshot>, CacheError> {
        let path = self.entry_path(key);
        let data = match fs::read(&path).await {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                trace!("no cache entry at {}", path.display());
                return Ok(None);
            }
            Err(e) => return Err(CacheError::Io(e)),
        };

        let corrupt = |reason: String| CacheError::Corrupt {
            key: key.to_string(),
            reason,
        };
        let record = CacheRecord::from_json(&data).map_err(|e| corrupt(e.to_string()))?;
        let snapshot = record.into_snapshot().map_err(corrupt)?;

        debug!("read cache entry {}", path.display());
        Ok(Some(snapshot))
    }

    async fn write(&self, key: &CacheKey, snapshot: &Snapshot) -> Result<(), CacheError> {
        let data = CacheRecord::from_snapshot(snapshot)
            .to_json()
            .map_err(|e| CacheError::Encode(e.to_string()))?;

        let final_path = self.entry_path(key);
        let _guard = self.write_lock(key).lock().await;

        fs::create_dir_all(&self.dir).await?;
        let temp_path = self.temp_path(key);
        if let Err(e) = Self::write_temp(&temp_path, &data).await {
            fs::remove_file(&temp_path).await.ok();
            return Err(e.into());
        }
        if let Err(e) = fs::rename(&temp_path, &final_path).await {
            warn!(
                "failed to install cache entry {}: {}",
                final_path.display(),
                e
            );
            fs::remove_file(&temp_path).await.ok();
            return Err(e.into());
        }

        debug!(
            "stored cache entry {} ({} bytes)",
            final_path.display(),
            data.len()
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "file"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    fn key(body: &str) -> CacheKey {
        let target = "https://example.com/api".parse().unwrap();
        CacheKey::derive(&hyper::Method::GET, &target, body.as_bytes())
    }

    fn snapshot(body: &str) -> Snapshot {
        Snapshot::new(200)
            .with_header("x-request-id", "abc")
            .with_content_header("content-type", "application/json")
            .with_body(body.to_string())
    }

    #[tokio::test]
    async fn test_missing_entry_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCacheStore::new(dir.path(), 4);
        assert!(store.read(&key("a")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCacheStore::new(dir.path(), 4);
        let k = key("a");

        store.write(&k, &snapshot(r#"{"Valido":true}"#)).await.unwrap();

        assert!(store.entry_path(&k).exists());
        let restored = store.read(&k).await.unwrap().unwrap();
        assert_eq!(restored, snapshot(r#"{"Valido":true}"#));
    }

    #[tokio::test]
    async fn test_write_overwrites_previous_entry() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCacheStore::new(dir.path(), 4);
        let k = key("a");

        // A longer first record must not leave trailing bytes behind
        store
            .write(&k, &snapshot(r#"{"Valido":true,"padding":"xxxxxxxxxxxxxxxx"}"#))
            .await
            .unwrap();
        store.write(&k, &snapshot(r#"{"v":2}"#)).await.unwrap();

        let restored = store.read(&k).await.unwrap().unwrap();
        assert_eq!(restored.body_text(), r#"{"v":2}"#);
    }

    #[tokio::test]
    async fn test_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("nested").join("cache");
        let store = FileCacheStore::new(&nested, 4);
        let k = key("a");

        store.write(&k, &snapshot("{}")).await.unwrap();
        assert!(nested.join(format!("{k}.dat")).exists());
    }

    #[tokio::test]
    async fn test_corrupt_entry_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCacheStore::new(dir.path(), 4);
        let k = key("a");

        std::fs::write(store.entry_path(&k), b"{ \"StatusCode\": 200, \"Dados").unwrap();

        let err = store.read(&k).await.unwrap_err();
        assert_eq!(err.kind(), "corrupt");
    }

    #[tokio::test]
    async fn test_reads_record_written_by_hand() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCacheStore::new(dir.path(), 4);
        let k = key("legacy");

        let record = r#"{
  "StatusCode": 200,
  "ResponseHeaders": {
    "Date": [ "Mon, 19 Oct 2026 10:00:00 GMT" ]
  },
  "ResponseContentHeaders": {
    "Content-Type": [ "application/json; charset=utf-8" ]
  },
  "DadosBody": "{\"Valido\":true}"
}"#;
        std::fs::write(store.entry_path(&k), record).unwrap();

        let restored = store.read(&k).await.unwrap().unwrap();
        assert_eq!(restored.status, 200);
        assert_eq!(
            restored.headers.get("Date").unwrap()[0],
            "Mon, 19 Oct 2026 10:00:00 GMT"
        );
        assert_eq!(restored.body_text(), r#"{"Valido":true}"#);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_writes_leave_one_complete_entry() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(FileCacheStore::new(dir.path(), 4));
        let k = key("shared");

        let bodies: Vec<String> = (0..32)
            .map(|i| format!(r#"{{"writer":{i},"payload":"{}"}}"#, "x".repeat(i * 512)))
            .collect();

        let mut handles = Vec::new();
        for body in bodies.clone() {
            let store = Arc::clone(&store);
            let k = k.clone();
            handles.push(tokio::spawn(async move {
                store.write(&k, &snapshot(&body)).await.unwrap();
            }));
        }

        // Readers racing the writers see either nothing or a complete entry
        for _ in 0..32 {
            if let Some(entry) = store.read(&k).await.unwrap() {
                assert!(bodies.contains(&entry.body_text().into_owned()));
            }
        }

        for handle in handles {
            handle.await.unwrap();
        }

        let final_entry = store.read(&k).await.unwrap().unwrap();
        assert!(bodies.contains(&final_entry.body_text().into_owned()));

        // Only the entry itself remains; no temp files are left behind
        let files: HashSet<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(files, HashSet::from([format!("{k}.dat")]));
    }
}
