//! File-per-key read-through resource cache.
//!
//! Layout on disk is `<root>/<namespace>/<key>.json`, one [`CacheEntry`] per
//! file. Reads check memory first and lazily pull a single file on a miss;
//! writes update memory and persist synchronously via write-to-temp + rename.
//!
//! The cache never talks to the remote service. A miss is resolved by the
//! caller, which fetches and then calls [`ResourceCache::set`].

#![allow(missing_docs)]

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::entry::{CacheEntry, CacheKey, validate_segment};
use crate::core::errors::{CtuError, Result};

const ENTRY_EXTENSION: &str = "json";
/// Placeholder file kept in checked-in cache directories.
const KEEP_FILE: &str = ".gitkeep";

type NamespaceData = HashMap<String, CacheEntry>;

/// Namespace-keyed cache with lazy file loading.
///
/// One lock guards the whole map, and persistence happens while the write lock
/// is held, so a `set` followed by `get` on the same key is always coherent.
#[derive(Debug)]
pub struct ResourceCache {
    root: PathBuf,
    data: RwLock<HashMap<String, NamespaceData>>,
}

impl ResourceCache {
    /// Create an empty cache rooted at `root`. Nothing is read until needed.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            data: RwLock::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Look up a value. Returns `None` on a miss.
    ///
    /// A memory miss falls back to `<root>/<namespace>/<key>.json`. Missing,
    /// unreadable, or corrupt files all count as misses.
    pub fn get(&self, namespace: &str, key: &str) -> Option<Value> {
        if let Some(entry) = self
            .data
            .read()
            .get(namespace)
            .and_then(|ns| ns.get(key))
        {
            tracing::debug!(namespace, key, "cache hit (memory)");
            return Some(entry.value.clone());
        }

        if validate_segment(namespace, key).is_err() {
            return None;
        }

        let mut data = self.data.write();
        // Another thread may have populated it between the two locks.
        if let Some(entry) = data.get(namespace).and_then(|ns| ns.get(key)) {
            return Some(entry.value.clone());
        }

        let path = self.entry_path(namespace, key);
        match read_entry(&path) {
            Ok(Some(mut entry)) => {
                tracing::debug!(namespace, key, "cache hit (disk)");
                namespace.clone_into(&mut entry.namespace);
                key.clone_into(&mut entry.key);
                let value = entry.value.clone();
                data.entry(namespace.to_string())
                    .or_default()
                    .insert(key.to_string(), entry);
                Some(value)
            }
            Ok(None) => {
                tracing::debug!(namespace, key, "cache miss");
                None
            }
            Err(error) => {
                tracing::warn!(namespace, key, %error, "discarding unreadable cache entry");
                None
            }
        }
    }

    /// Typed lookup. A value that no longer matches `T` counts as a miss.
    pub fn get_as<T: DeserializeOwned>(&self, namespace: &str, key: &str) -> Option<T> {
        let raw = self.get(namespace, key)?;
        match Self::parse_data(&raw) {
            Ok(value) => Some(value),
            Err(error) => {
                tracing::warn!(namespace, key, %error, "cached value has unexpected shape");
                None
            }
        }
    }

    /// Store a value in memory and persist it.
    ///
    /// The in-memory value is kept even when persisting fails, so the running
    /// process stays coherent; the error is returned for logging.
    pub fn set<T: Serialize + ?Sized>(&self, namespace: &str, key: &str, value: &T) -> Result<()> {
        let value = serde_json::to_value(value)?;
        self.set_value(namespace, key, value)
    }

    /// [`ResourceCache::set`] for an already-serialized value.
    pub fn set_value(&self, namespace: &str, key: &str, value: Value) -> Result<()> {
        validate_segment(namespace, key)?;
        let now = chrono::Utc::now().timestamp();
        tracing::debug!(namespace, key, "caching");

        let mut data = self.data.write();
        let slot = data.entry(namespace.to_string()).or_default();
        let entry = match slot.remove(key) {
            Some(existing) => existing.overwritten(value, now),
            None => CacheEntry::new(namespace, key, value, now),
        };
        let persisted = self.write_entry(&entry);
        slot.insert(key.to_string(), entry);
        persisted
    }

    /// Drop every in-memory entry and remove the persisted namespaces.
    ///
    /// Callers that want the data back snapshot [`ResourceCache::entries`]
    /// first and re-fetch each key.
    pub fn invalidate(&self) -> Result<()> {
        tracing::debug!(root = %self.root.display(), "invalidating all cache entries");
        let mut data = self.data.write();
        data.clear();

        let listing = match fs::read_dir(&self.root) {
            Ok(listing) => listing,
            Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(error) => return Err(CtuError::io(&self.root, error)),
        };
        for item in listing {
            let item = item.map_err(|source| CtuError::io(&self.root, source))?;
            if item.file_name() == KEEP_FILE {
                continue;
            }
            let path = item.path();
            tracing::debug!(path = %path.display(), "removing");
            let removed = if path.is_dir() {
                fs::remove_dir_all(&path)
            } else {
                fs::remove_file(&path)
            };
            removed.map_err(|source| CtuError::io(&path, source))?;
        }
        Ok(())
    }

    /// Every (namespace, key) currently held in memory, sorted.
    #[must_use]
    pub fn entries(&self) -> Vec<CacheKey> {
        let data = self.data.read();
        let mut keys: Vec<CacheKey> = data
            .iter()
            .flat_map(|(namespace, ns)| {
                ns.keys()
                    .map(move |key| CacheKey::new(namespace.clone(), key.clone()))
            })
            .collect();
        keys.sort();
        keys
    }

    /// Number of in-memory entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.read().values().map(HashMap::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Decode a stored blob into a typed value.
    pub fn parse_data<T: DeserializeOwned>(raw: &Value) -> Result<T> {
        T::deserialize(raw).map_err(|error| CtuError::decode("cache entry", error))
    }

    /// Warm the in-memory map from every readable file under the root.
    ///
    /// Corrupt files are skipped with a warning. Returns the number of
    /// entries loaded.
    pub fn load(&self) -> Result<usize> {
        tracing::debug!(root = %self.root.display(), "loading cache");
        let namespaces = match fs::read_dir(&self.root) {
            Ok(listing) => listing,
            Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(0),
            Err(error) => return Err(CtuError::io(&self.root, error)),
        };

        let mut loaded = HashMap::<String, NamespaceData>::new();
        for ns_dir in namespaces {
            let ns_dir = ns_dir.map_err(|source| CtuError::io(&self.root, source))?;
            let ns_path = ns_dir.path();
            if !ns_path.is_dir() {
                continue;
            }
            let namespace = ns_dir.file_name().to_string_lossy().into_owned();
            let files = fs::read_dir(&ns_path).map_err(|source| CtuError::io(&ns_path, source))?;
            for file in files {
                let file = file.map_err(|source| CtuError::io(&ns_path, source))?;
                let path = file.path();
                if path.extension().and_then(|ext| ext.to_str()) != Some(ENTRY_EXTENSION) {
                    continue;
                }
                let Some(key) = path.file_stem().map(|s| s.to_string_lossy().into_owned()) else {
                    continue;
                };
                match read_entry(&path) {
                    Ok(Some(mut entry)) => {
                        entry.namespace.clone_from(&namespace);
                        entry.key.clone_from(&key);
                        loaded.entry(namespace.clone()).or_default().insert(key, entry);
                    }
                    Ok(None) => {}
                    Err(error) => {
                        tracing::warn!(path = %path.display(), %error, "skipping corrupt cache file");
                    }
                }
            }
        }

        let count = loaded.values().map(HashMap::len).sum();
        let mut data = self.data.write();
        for (namespace, entries) in loaded {
            let slot = data.entry(namespace).or_default();
            for (key, entry) in entries {
                // Values written during this run are newer than what is on disk.
                slot.entry(key).or_insert(entry);
            }
        }
        tracing::info!(entries = count, "cache loaded");
        Ok(count)
    }

    /// Rewrite every in-memory entry to disk.
    ///
    /// Keeps going after a failed write and reports the first error.
    pub fn flush(&self) -> Result<usize> {
        let data = self.data.read();
        let mut written = 0usize;
        let mut first_error = None;
        for entry in data.values().flat_map(HashMap::values) {
            match self.write_entry(entry) {
                Ok(()) => written += 1,
                Err(error) => {
                    tracing::warn!(entry = %entry.cache_key(), %error, "flush failed");
                    first_error.get_or_insert(error);
                }
            }
        }
        tracing::debug!(written, "cache flushed");
        first_error.map_or(Ok(written), Err)
    }

    fn entry_path(&self, namespace: &str, key: &str) -> PathBuf {
        self.root
            .join(namespace)
            .join(format!("{key}.{ENTRY_EXTENSION}"))
    }

    fn write_entry(&self, entry: &CacheEntry) -> Result<()> {
        let dir = self.root.join(&entry.namespace);
        fs::create_dir_all(&dir).map_err(|source| CtuError::io(&dir, source))?;

        let path = self.entry_path(&entry.namespace, &entry.key);
        let tmp_path = dir.join(format!("{}.{ENTRY_EXTENSION}.tmp", entry.key));
        let bytes = serde_json::to_vec(entry)?;
        fs::write(&tmp_path, bytes).map_err(|source| CtuError::io(&tmp_path, source))?;
        fs::rename(&tmp_path, &path).map_err(|source| CtuError::io(&path, source))?;
        Ok(())
    }
}

fn read_entry(path: &Path) -> Result<Option<CacheEntry>> {
    let raw = match fs::read(path) {
        Ok(raw) => raw,
        Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(error) => return Err(CtuError::io(path, error)),
    };
    serde_json::from_slice(&raw)
        .map(Some)
        .map_err(|error| CtuError::decode(path.display().to_string(), error))
}

/// Flushes the cache when dropped, on every exit path of the owning scope.
#[derive(Debug)]
pub struct CacheFlushGuard {
    cache: Arc<ResourceCache>,
}

impl CacheFlushGuard {
    #[must_use]
    pub fn new(cache: Arc<ResourceCache>) -> Self {
        Self { cache }
    }

    #[must_use]
    pub fn cache(&self) -> &Arc<ResourceCache> {
        &self.cache
    }
}

impl Drop for CacheFlushGuard {
    fn drop(&mut self) {
        if let Err(error) = self.cache.flush() {
            tracing::error!(%error, "final cache flush failed");
        }
    }
}
