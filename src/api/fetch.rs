//! Cache-or-client resolution for every hierarchy level.
//!
//! All levels share one code path. The level decides the cache namespace,
//! the cache key, and which client call fills a miss.

#![allow(missing_docs)]

use std::sync::Arc;

use super::client::ResourceClient;
use super::model::{Resource, Task};
use crate::cache::{CacheKey, ResourceCache, namespace};
use crate::core::errors::{CtuError, Result};
use crate::navigator::level::HierarchyLevel;
use crate::navigator::loader::CancelToken;

/// Key of the single workspace collection.
pub const WORKSPACES_KEY: &str = "teams";

/// Cache slot for a level's collection under `parent_id`.
pub fn collection_slot(level: HierarchyLevel, parent_id: Option<&str>) -> Result<CacheKey> {
    let key = match (level, parent_id) {
        (HierarchyLevel::Workspace, _) => WORKSPACES_KEY,
        (_, Some(parent)) => parent,
        (_, None) => {
            return Err(CtuError::InvalidCacheKey {
                namespace: level.namespace().to_string(),
                key: String::new(),
            });
        }
    };
    Ok(CacheKey::new(level.namespace(), key))
}

/// Outcome of [`ResourceFetcher::refresh_all`].
#[derive(Debug, Default)]
pub struct RefreshReport {
    pub refreshed: usize,
    pub failures: Vec<(CacheKey, CtuError)>,
}

impl RefreshReport {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Read-through access to remote resources.
pub struct ResourceFetcher {
    cache: Arc<ResourceCache>,
    client: Arc<dyn ResourceClient>,
}

impl std::fmt::Debug for ResourceFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceFetcher")
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

impl ResourceFetcher {
    #[must_use]
    pub fn new(cache: Arc<ResourceCache>, client: Arc<dyn ResourceClient>) -> Self {
        Self { cache, client }
    }

    #[must_use]
    pub fn cache(&self) -> &Arc<ResourceCache> {
        &self.cache
    }

    /// Children of `parent_id` at `level`, from cache when possible.
    ///
    /// A cached value that fails to decode is treated as a miss. Failing to
    /// write the fresh result back is logged and otherwise ignored. A
    /// cancelled request neither fetches nor writes.
    pub fn load_children(
        &self,
        level: HierarchyLevel,
        parent_id: Option<&str>,
        cancel: &CancelToken,
    ) -> Result<Vec<Resource>> {
        let slot = collection_slot(level, parent_id)?;
        if let Some(raw) = self.cache.get(&slot.namespace, &slot.key) {
            match Resource::collection_from_value(level, &raw) {
                Ok(items) => return Ok(items),
                Err(error) => tracing::warn!(entry = %slot, %error, "refetching undecodable entry"),
            }
        }

        cancel.check("fetch")?;
        let items = self.client.fetch_children(level, parent_id)?;
        tracing::debug!(entry = %slot, count = items.len(), "fetched");
        cancel.check("cache write")?;
        self.store(&slot, Resource::collection_to_value(&items));
        Ok(items)
    }

    /// Single task detail, from cache when possible.
    pub fn load_task(&self, task_id: &str, cancel: &CancelToken) -> Result<Task> {
        if let Some(task) = self.cache.get_as::<Task>(namespace::TASK, task_id) {
            return Ok(task);
        }
        cancel.check("fetch")?;
        let task = self.client.fetch_task(task_id)?;
        cancel.check("cache write")?;
        let slot = CacheKey::new(namespace::TASK, task_id);
        self.store(&slot, serde_json::to_value(&task).map_err(CtuError::from));
        Ok(task)
    }

    /// Invalidate the cache, then re-fetch every entry it held.
    ///
    /// Fails if the invalidation itself fails or the request is cancelled;
    /// cancellation is checked between entries and before each write.
    /// Individual re-fetch failures are collected in the report.
    pub fn refresh_all(&self, cancel: &CancelToken) -> Result<RefreshReport> {
        let known = self.cache.entries();
        tracing::info!(entries = known.len(), "refreshing cache");
        self.cache.invalidate()?;

        let mut report = RefreshReport::default();
        for slot in known {
            if let Err(error) = cancel.check("refresh") {
                tracing::info!(refreshed = report.refreshed, "cache refresh cancelled");
                return Err(error);
            }
            match self.refetch(&slot, cancel) {
                Ok(()) => report.refreshed += 1,
                Err(error @ CtuError::Cancelled { .. }) => {
                    tracing::info!(refreshed = report.refreshed, "cache refresh cancelled");
                    return Err(error);
                }
                Err(error) => {
                    tracing::warn!(entry = %slot, %error, "refresh failed");
                    report.failures.push((slot, error));
                }
            }
        }
        tracing::info!(
            refreshed = report.refreshed,
            failed = report.failures.len(),
            "cache refresh finished"
        );
        Ok(report)
    }

    fn refetch(&self, slot: &CacheKey, cancel: &CancelToken) -> Result<()> {
        if slot.namespace == namespace::TASK {
            let task = self.client.fetch_task(&slot.key)?;
            cancel.check("cache write")?;
            return self.cache.set(&slot.namespace, &slot.key, &task);
        }
        let level = HierarchyLevel::from_namespace(&slot.namespace).ok_or_else(|| {
            CtuError::InvalidCacheKey {
                namespace: slot.namespace.clone(),
                key: slot.key.clone(),
            }
        })?;
        let parent = (!level.is_root()).then_some(slot.key.as_str());
        let items = self.client.fetch_children(level, parent)?;
        cancel.check("cache write")?;
        self.cache
            .set_value(&slot.namespace, &slot.key, Resource::collection_to_value(&items)?)
    }

    fn store(&self, slot: &CacheKey, value: Result<serde_json::Value>) {
        let outcome = value.and_then(|value| self.cache.set_value(&slot.namespace, &slot.key, value));
        if let Err(error) = outcome {
            tracing::warn!(entry = %slot, %error, "cache write failed; keeping in-memory copy");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::model::{Space, Workspace};
    use parking_lot::Mutex;

    #[derive(Default)]
    struct CountingClient {
        calls: Mutex<Vec<(HierarchyLevel, Option<String>)>>,
        fail: bool,
        /// Set while a fetch is on the wire, as a user cancelling mid-request would.
        cancel_during_fetch: Option<CancelToken>,
    }

    impl ResourceClient for CountingClient {
        fn fetch_children(&self, level: HierarchyLevel, parent_id: Option<&str>) -> Result<Vec<Resource>> {
            self.calls.lock().push((level, parent_id.map(str::to_string)));
            if let Some(token) = &self.cancel_during_fetch {
                token.cancel();
            }
            if self.fail {
                return Err(CtuError::Transport {
                    endpoint: "/test".into(),
                    details: "down".into(),
                });
            }
            Ok(match level {
                HierarchyLevel::Workspace => vec![Resource::Workspace(Workspace {
                    id: "1".into(),
                    name: "Acme".into(),
                    color: None,
                })],
                _ => vec![Resource::Space(Space {
                    id: "s1".into(),
                    name: "Eng".into(),
                    private: false,
                })],
            })
        }

        fn fetch_task(&self, task_id: &str) -> Result<Task> {
            Err(CtuError::Api {
                endpoint: format!("/task/{task_id}"),
                details: "not found".into(),
            })
        }
    }

    fn live() -> CancelToken {
        CancelToken::default()
    }

    fn fetcher(dir: &std::path::Path, client: Arc<CountingClient>) -> ResourceFetcher {
        ResourceFetcher::new(Arc::new(ResourceCache::new(dir)), client)
    }

    #[test]
    fn workspace_slot_ignores_parent() {
        let slot = collection_slot(HierarchyLevel::Workspace, Some("x")).expect("slot");
        assert_eq!(slot, CacheKey::new("teams", "teams"));
        assert!(collection_slot(HierarchyLevel::List, None).is_err());
    }

    #[test]
    fn second_load_is_served_from_cache() {
        let dir = tempfile::tempdir().expect("tempdir");
        let client = Arc::new(CountingClient::default());
        let fetcher = fetcher(dir.path(), Arc::clone(&client));

        let first = fetcher
            .load_children(HierarchyLevel::Space, Some("1"), &live())
            .expect("first");
        let second = fetcher
            .load_children(HierarchyLevel::Space, Some("1"), &live())
            .expect("second");
        assert_eq!(first, second);
        assert_eq!(client.calls.lock().len(), 1);
    }

    #[test]
    fn undecodable_entry_triggers_refetch() {
        let dir = tempfile::tempdir().expect("tempdir");
        let client = Arc::new(CountingClient::default());
        let fetcher = fetcher(dir.path(), Arc::clone(&client));
        fetcher
            .cache()
            .set(namespace::SPACES, "1", &serde_json::json!({"bogus": 1}))
            .expect("seed");

        let items = fetcher
            .load_children(HierarchyLevel::Space, Some("1"), &live())
            .expect("load");
        assert_eq!(items.len(), 1);
        assert_eq!(client.calls.lock().len(), 1);
    }

    #[test]
    fn client_failure_is_not_cached() {
        let dir = tempfile::tempdir().expect("tempdir");
        let client = Arc::new(CountingClient {
            fail: true,
            ..CountingClient::default()
        });
        let fetcher = fetcher(dir.path(), client);
        let err = fetcher
            .load_children(HierarchyLevel::Workspace, None, &live())
            .expect_err("down");
        assert!(err.is_retryable());
        assert!(fetcher.cache().is_empty());
    }

    #[test]
    fn refresh_all_refetches_known_keys_and_reports_failures() {
        let dir = tempfile::tempdir().expect("tempdir");
        let client = Arc::new(CountingClient::default());
        let fetcher = fetcher(dir.path(), Arc::clone(&client));
        fetcher.load_children(HierarchyLevel::Workspace, None, &live()).expect("ws");
        fetcher.load_children(HierarchyLevel::Space, Some("1"), &live()).expect("spaces");
        fetcher
            .cache()
            .set(namespace::TASK, "t9", &serde_json::json!({"id": "t9", "name": "x"}))
            .expect("seed task");

        let report = fetcher.refresh_all(&live()).expect("refresh");
        assert_eq!(report.refreshed, 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].0, CacheKey::new("task", "t9"));
        assert!(!report.is_clean());

        let calls = client.calls.lock().clone();
        assert_eq!(calls.len(), 4);
        assert_eq!(calls[2].0, HierarchyLevel::Space);
        assert_eq!(calls[3], (HierarchyLevel::Workspace, None));
        assert_eq!(
            fetcher.cache().entries(),
            vec![CacheKey::new("spaces", "1"), CacheKey::new("teams", "teams")]
        );
    }

    #[test]
    fn cancel_during_fetch_skips_cache_write() {
        let dir = tempfile::tempdir().expect("tempdir");
        let token = CancelToken::default();
        let client = Arc::new(CountingClient {
            cancel_during_fetch: Some(token.clone()),
            ..CountingClient::default()
        });
        let fetcher = fetcher(dir.path(), Arc::clone(&client));

        let err = fetcher
            .load_children(HierarchyLevel::Space, Some("1"), &token)
            .expect_err("cancelled");
        assert!(matches!(err, CtuError::Cancelled { .. }));
        assert_eq!(client.calls.lock().len(), 1);
        assert!(fetcher.cache().is_empty());
    }

    #[test]
    fn cancelled_before_fetch_never_calls_client() {
        let dir = tempfile::tempdir().expect("tempdir");
        let client = Arc::new(CountingClient::default());
        let fetcher = fetcher(dir.path(), Arc::clone(&client));
        let token = CancelToken::default();
        token.cancel();

        assert!(fetcher.load_children(HierarchyLevel::Workspace, None, &token).is_err());
        assert!(matches!(
            fetcher.load_task("t1", &token),
            Err(CtuError::Cancelled { .. })
        ));
        assert!(client.calls.lock().is_empty());
    }
}
