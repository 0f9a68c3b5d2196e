// Cache store for reading and writing cached API results.
// Keeps one JSON index of entries, checks TTL on read, and rewrites the whole index on write.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{ActivityError, Result};

/// Default TTL for cached API results: 10 minutes.
pub const DEFAULT_TTL: Duration = Duration::from_secs(10 * 60);

/// A single cached value with the time it was stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// The cached data.
    pub data: Value,
    /// When the data was cached, in epoch milliseconds.
    pub timestamp: i64,
}

impl CacheEntry {
    pub fn new(data: Value, now: DateTime<Utc>) -> Self {
        Self {
            data,
            timestamp: now.timestamp_millis(),
        }
    }

    /// An entry is expired once `now - stored_at >= ttl`.
    pub fn is_expired(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        now.timestamp_millis().saturating_sub(self.timestamp) >= ttl_ms
    }
}

/// The full persisted index, keyed by lookup key.
pub type CacheIndex = BTreeMap<String, CacheEntry>;

/// Result of a cache read.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup<T> {
    Hit(T),
    Miss,
}

impl<T> Lookup<T> {
    pub fn is_hit(&self) -> bool {
        matches!(self, Lookup::Hit(_))
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Lookup::Hit(data) => Some(data),
            Lookup::Miss => None,
        }
    }
}

/// Storage for the serialized cache index.
pub trait CacheBackend: Send + Sync {
    /// Read the persisted index, or `None` if nothing has been written yet.
    fn load(&self) -> Result<Option<String>>;

    /// Replace the persisted index with `contents`.
    fn save(&self, contents: &str) -> Result<()>;
}

/// Index stored as a single JSON file.
#[derive(Debug, Clone)]
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CacheBackend for FileBackend {
    fn load(&self) -> Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(&self.path)?;
        Ok(Some(contents))
    }

    fn save(&self, contents: &str) -> Result<()> {
        write_atomic(&self.path, contents)
    }
}

/// Replace `path` with `contents` via a synced temp file and a rename, so
/// readers see either the old file or the new one. Creates parent
/// directories as needed.
pub(crate) fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let temp_path = path.with_extension("tmp");
    let mut file = fs::File::create(&temp_path)?;
    file.write_all(contents.as_bytes())?;
    file.sync_all()?;
    fs::rename(&temp_path, path)?;

    Ok(())
}

/// Index held in memory, for tests and throwaway runs.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    contents: Mutex<Option<String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from pre-existing persisted contents.
    pub fn with_contents(contents: impl Into<String>) -> Self {
        Self {
            contents: Mutex::new(Some(contents.into())),
        }
    }

    /// Raw persisted contents.
    pub fn contents(&self) -> Option<String> {
        self.contents
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl CacheBackend for MemoryBackend {
    fn load(&self) -> Result<Option<String>> {
        Ok(self.contents())
    }

    fn save(&self, contents: &str) -> Result<()> {
        *self
            .contents
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(contents.to_string());
        Ok(())
    }
}

/// TTL cache over a single persisted index.
pub struct CacheStore<B: CacheBackend = FileBackend> {
    backend: B,
    ttl: Duration,
    /// Serializes read-modify-write cycles on the index.
    write_lock: Mutex<()>,
}

impl CacheStore<FileBackend> {
    /// Open a file-backed store at `path` with the default TTL.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self::new(FileBackend::new(path))
    }
}

impl CacheStore<MemoryBackend> {
    pub fn in_memory() -> Self {
        Self::new(MemoryBackend::new())
    }
}

impl<B: CacheBackend> CacheStore<B> {
    pub fn new(backend: B) -> Self {
        Self::with_ttl(backend, DEFAULT_TTL)
    }

    pub fn with_ttl(backend: B, ttl: Duration) -> Self {
        Self {
            backend,
            ttl,
            write_lock: Mutex::new(()),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Look up `key`, returning a hit only for a present, unexpired entry.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Lookup<T> {
        self.get_at(key, Utc::now())
    }

    /// Look up `key` as of `now`. Expired entries are left in place.
    pub fn get_at<T: DeserializeOwned>(&self, key: &str, now: DateTime<Utc>) -> Lookup<T> {
        let index = self.load_index();
        let Some(entry) = index.get(key) else {
            debug!(key, "cache miss");
            return Lookup::Miss;
        };

        if entry.is_expired(self.ttl, now) {
            debug!(key, "cache entry expired");
            return Lookup::Miss;
        }

        match serde_json::from_value(entry.data.clone()) {
            Ok(data) => {
                debug!(key, "cache hit");
                Lookup::Hit(data)
            }
            Err(e) => {
                warn!(key, error = %e, "cached data has unexpected shape, ignoring");
                Lookup::Miss
            }
        }
    }

    /// Raw entry for `key`, regardless of age.
    pub fn entry(&self, key: &str) -> Option<CacheEntry> {
        self.load_index().remove(key)
    }

    /// Replace the entry for `key` and persist the whole index.
    pub fn put<T: Serialize + ?Sized>(&self, key: &str, data: &T) -> Result<()> {
        self.put_at(key, data, Utc::now())
    }

    /// Replace the entry for `key` as of `now` and persist the whole index.
    pub fn put_at<T: Serialize + ?Sized>(
        &self,
        key: &str,
        data: &T,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let value = serde_json::to_value(data)?;
        self.modify(|index| {
            index.insert(key.to_string(), CacheEntry::new(value, now));
        })?;
        debug!(key, "cache entry written");
        Ok(())
    }

    /// Remove the entry for `key`. Returns whether one was present.
    pub fn invalidate(&self, key: &str) -> Result<bool> {
        self.modify(|index| index.remove(key).is_some())
    }

    /// Remove every entry whose key starts with `prefix`.
    pub fn invalidate_prefix(&self, prefix: &str) -> Result<usize> {
        self.modify(|index| {
            let before = index.len();
            index.retain(|key, _| !key.starts_with(prefix));
            before - index.len()
        })
    }

    /// Drop every entry.
    pub fn clear(&self) -> Result<()> {
        self.modify(|index| index.clear())
    }

    /// Number of entries in the index, expired ones included.
    pub fn len(&self) -> usize {
        self.load_index().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn modify<R>(&self, f: impl FnOnce(&mut CacheIndex) -> R) -> Result<R> {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let mut index = self.load_index();
        let result = f(&mut index);
        let json = serde_json::to_string_pretty(&index)?;
        self.backend.save(&json)?;
        Ok(result)
    }

    /// Load the index, falling back to an empty one if it is unreadable.
    fn load_index(&self) -> CacheIndex {
        match self.read_index() {
            Ok(index) => index,
            Err(e) => {
                warn!(error = %e, "discarding unreadable cache index");
                CacheIndex::new()
            }
        }
    }

    fn read_index(&self) -> Result<CacheIndex> {
        match self.backend.load()? {
            None => Ok(CacheIndex::new()),
            Some(contents) => serde_json::from_str(&contents)
                .map_err(|e| ActivityError::CacheCorrupt(e.to_string())),
        }
    }
}
