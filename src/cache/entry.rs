//! Persisted cache record and namespace names.

#![allow(missing_docs)]

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::errors::{CtuError, Result};

/// Namespace names, one per cached resource type.
pub mod namespace {
    pub const TEAMS: &str = "teams";
    pub const SPACES: &str = "spaces";
    pub const FOLDERS: &str = "folders";
    pub const LISTS: &str = "lists";
    pub const TASKS: &str = "tasks";
    /// Single-task detail records keyed by task id.
    pub const TASK: &str = "task";
}

/// Address of one cached value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CacheKey {
    pub namespace: String,
    pub key: String,
}

impl CacheKey {
    #[must_use]
    pub fn new(namespace: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            key: key.into(),
        }
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.namespace, self.key)
    }
}

/// One `<namespace>/<key>.json` file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub namespace: String,
    pub key: String,
    pub value: Value,
    /// Unix seconds of the first write for this key.
    pub created_at: i64,
    /// Unix seconds of the most recent write.
    pub updated_at: i64,
}

impl CacheEntry {
    /// Fresh entry stamped with `now`.
    #[must_use]
    pub fn new(namespace: &str, key: &str, value: Value, now: i64) -> Self {
        Self {
            namespace: namespace.to_string(),
            key: key.to_string(),
            value,
            created_at: now,
            updated_at: now,
        }
    }

    /// Replace the value, keeping the original creation time.
    #[must_use]
    pub fn overwritten(self, value: Value, now: i64) -> Self {
        Self {
            value,
            updated_at: now,
            ..self
        }
    }

    #[must_use]
    pub fn cache_key(&self) -> CacheKey {
        CacheKey::new(self.namespace.clone(), self.key.clone())
    }
}

/// Reject namespace/key pairs that cannot be used as a single path segment.
pub fn validate_segment(namespace: &str, key: &str) -> Result<()> {
    let ok = |segment: &str| {
        !segment.is_empty()
            && segment != "."
            && segment != ".."
            && !segment.contains(['/', '\\', '\0'])
    };
    if ok(namespace) && ok(key) {
        Ok(())
    } else {
        Err(CtuError::InvalidCacheKey {
            namespace: namespace.to_string(),
            key: key.to_string(),
        })
    }
}
