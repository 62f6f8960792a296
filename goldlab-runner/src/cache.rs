//! TTL-keyed stage cache.
//!
//! The pipeline depends only on [`StageCache`]; the file-backed cache stores
//! one JSON envelope per key, the in-memory cache is for tests and one-shot
//! runs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cache entry (de)serialization failed: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Key-value cache with per-read time-to-live.
pub trait StageCache: Send + Sync {
    /// The value stored under `key`, unless it is older than `ttl`.
    fn get(&self, key: &str, ttl: Duration) -> Result<Option<Value>, CacheError>;

    fn set(&self, key: &str, value: Value) -> Result<(), CacheError>;

    fn remove(&self, key: &str) -> Result<(), CacheError>;

    /// Drop every entry older than `ttl`. Returns how many were dropped.
    fn prune(&self, ttl: Duration) -> Result<usize, CacheError>;

    /// Drop every entry.
    fn clear(&self) -> Result<(), CacheError>;
}

/// On-disk envelope.
#[derive(Debug, Serialize, Deserialize)]
struct Entry {
    stored_at: DateTime<Utc>,
    value: Value,
}

/// Largest clock step backwards tolerated between `set` and `get`.
const MAX_CLOCK_SKEW_SECS: i64 = 5;

/// Entries stamped further in the future than [`MAX_CLOCK_SKEW_SECS`] are stale.
fn is_fresh(stored_at: DateTime<Utc>, ttl: Duration) -> bool {
    let age = Utc::now().signed_duration_since(stored_at);
    if age < chrono::Duration::seconds(-MAX_CLOCK_SKEW_SECS) {
        return false;
    }
    age.to_std().unwrap_or(Duration::ZERO) < ttl
}

/// File-backed cache: `{cache_dir}/{key}.json`.
#[derive(Debug, Clone)]
pub struct FileStageCache {
    cache_dir: PathBuf,
}

impl FileStageCache {
    /// Creates the directory if it doesn't exist.
    pub fn new(cache_dir: impl AsRef<Path>) -> Result<Self, CacheError> {
        let cache_dir = cache_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&cache_dir)?;
        Ok(Self { cache_dir })
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Number of entries on disk, fresh or not.
    pub fn len(&self) -> Result<usize, CacheError> {
        Ok(self.entry_paths()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, CacheError> {
        Ok(self.len()? == 0)
    }

    /// Keys currently on disk with their storage time.
    pub fn entries(&self) -> Result<Vec<(String, DateTime<Utc>)>, CacheError> {
        let mut out = Vec::new();
        for path in self.entry_paths()? {
            let Some(key) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let content = std::fs::read_to_string(&path)?;
            if let Ok(entry) = serde_json::from_str::<Entry>(&content) {
                out.push((key.to_string(), entry.stored_at));
            }
        }
        out.sort();
        Ok(out)
    }

    fn entry_paths(&self) -> Result<Vec<PathBuf>, CacheError> {
        let mut paths = Vec::new();
        for entry in std::fs::read_dir(&self.cache_dir)? {
            let path = entry?.path();
            if path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("json") {
                paths.push(path);
            }
        }
        Ok(paths)
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        let clean: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.cache_dir.join(format!("{clean}.json"))
    }
}

impl StageCache for FileStageCache {
    fn get(&self, key: &str, ttl: Duration) -> Result<Option<Value>, CacheError> {
        let path = self.entry_path(key);
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&path)?;
        let entry: Entry = match serde_json::from_str(&content) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(key, error = %e, "discarding unreadable cache entry");
                std::fs::remove_file(&path)?;
                return Ok(None);
            }
        };
        if !is_fresh(entry.stored_at, ttl) {
            std::fs::remove_file(&path)?;
            return Ok(None);
        }
        Ok(Some(entry.value))
    }

    fn set(&self, key: &str, value: Value) -> Result<(), CacheError> {
        let entry = Entry {
            stored_at: Utc::now(),
            value,
        };
        let path = self.entry_path(key);
        let tmp_path = path.with_extension("json.tmp");
        std::fs::write(&tmp_path, serde_json::to_string(&entry)?)?;
        std::fs::rename(&tmp_path, &path)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), CacheError> {
        let path = self.entry_path(key);
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }

    fn prune(&self, ttl: Duration) -> Result<usize, CacheError> {
        let mut dropped = 0;
        for path in self.entry_paths()? {
            let keep = std::fs::read_to_string(&path)
                .ok()
                .and_then(|content| serde_json::from_str::<Entry>(&content).ok())
                .is_some_and(|entry| is_fresh(entry.stored_at, ttl));
            if !keep {
                std::fs::remove_file(&path)?;
                dropped += 1;
            }
        }
        Ok(dropped)
    }

    fn clear(&self) -> Result<(), CacheError> {
        for path in self.entry_paths()? {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }
}

/// In-memory cache.
#[derive(Debug, Default)]
pub struct MemoryStageCache {
    entries: Mutex<HashMap<String, (DateTime<Utc>, Value)>>,
}

impl MemoryStageCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, (DateTime<Utc>, Value)>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl StageCache for MemoryStageCache {
    fn get(&self, key: &str, ttl: Duration) -> Result<Option<Value>, CacheError> {
        let mut entries = self.lock();
        let Some((stored_at, value)) = entries.get(key) else {
            return Ok(None);
        };
        if is_fresh(*stored_at, ttl) {
            return Ok(Some(value.clone()));
        }
        entries.remove(key);
        Ok(None)
    }

    fn set(&self, key: &str, value: Value) -> Result<(), CacheError> {
        self.lock().insert(key.to_string(), (Utc::now(), value));
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), CacheError> {
        self.lock().remove(key);
        Ok(())
    }

    fn prune(&self, ttl: Duration) -> Result<usize, CacheError> {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, (stored_at, _)| is_fresh(*stored_at, ttl));
        Ok(before - entries.len())
    }

    fn clear(&self) -> Result<(), CacheError> {
        self.lock().clear();
        Ok(())
    }
}
