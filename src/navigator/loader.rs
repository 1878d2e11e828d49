//! Background execution of fetches.
//!
//! Each request runs on its own named thread and reports back with exactly
//! one [`LoadResult`] on the shared results channel. Submitting never blocks.

#![allow(missing_docs)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use crossbeam_channel::Sender;
use parking_lot::Mutex;

use super::level::HierarchyLevel;
use crate::api::fetch::{RefreshReport, ResourceFetcher};
use crate::api::model::{Resource, Task};
use crate::core::errors::{CtuError, Result};

/// Identity of one outstanding request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestTag {
    pub request_id: u64,
    /// Level of the frame that issued the request.
    pub level: HierarchyLevel,
    /// Parent id of that frame (or the task id for detail requests).
    pub parent_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadKind {
    Children {
        level: HierarchyLevel,
        parent_id: Option<String>,
    },
    Task {
        task_id: String,
    },
    Refresh,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    pub tag: RequestTag,
    pub kind: LoadKind,
}

#[derive(Debug)]
pub enum LoadOutcome {
    Children(Result<Vec<Resource>>),
    Task(Result<Task>),
    Refreshed(Result<RefreshReport>),
}

impl LoadOutcome {
    fn cancelled(kind: &LoadKind, details: String) -> Self {
        let error = CtuError::Cancelled { details };
        match kind {
            LoadKind::Children { .. } => Self::Children(Err(error)),
            LoadKind::Task { .. } => Self::Task(Err(error)),
            LoadKind::Refresh => Self::Refreshed(Err(error)),
        }
    }

    fn failed(kind: &LoadKind, error: CtuError) -> Self {
        match kind {
            LoadKind::Children { .. } => Self::Children(Err(error)),
            LoadKind::Task { .. } => Self::Task(Err(error)),
            LoadKind::Refresh => Self::Refreshed(Err(error)),
        }
    }
}

/// Completion message for one [`LoadRequest`].
#[derive(Debug)]
pub struct LoadResult {
    pub tag: RequestTag,
    pub outcome: LoadOutcome,
}

/// Shared cancellation flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// `Err(Cancelled)` once the token is set, naming the step that stopped.
    pub fn check(&self, step: &str) -> Result<()> {
        if self.is_cancelled() {
            return Err(CtuError::Cancelled {
                details: format!("stopped before {step}"),
            });
        }
        Ok(())
    }
}

/// Runs fetches off the UI thread.
#[derive(Debug)]
pub struct AsyncLoader {
    fetcher: Arc<ResourceFetcher>,
    results: Sender<LoadResult>,
    inflight: Arc<Mutex<HashMap<u64, CancelToken>>>,
}

impl AsyncLoader {
    #[must_use]
    pub fn new(fetcher: Arc<ResourceFetcher>, results: Sender<LoadResult>) -> Self {
        Self {
            fetcher,
            results,
            inflight: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Start `request` in the background and return its cancellation token.
    ///
    /// If the worker thread cannot be spawned the failure is delivered as the
    /// request's completion, so every request still gets exactly one result.
    pub fn submit(&self, request: LoadRequest) -> CancelToken {
        let token = CancelToken::default();
        let id = request.tag.request_id;
        self.inflight.lock().insert(id, token.clone());
        tracing::debug!(request_id = id, kind = ?request.kind, "submitting load");

        let fetcher = Arc::clone(&self.fetcher);
        let results = self.results.clone();
        let inflight = Arc::clone(&self.inflight);
        let worker_token = token.clone();
        // The request is needed again if spawning fails.
        let fallback = request.clone();

        let spawned = thread::Builder::new()
            .name(format!("ctu-load-{id}"))
            .spawn(move || {
                let LoadRequest { tag, kind } = request;
                let outcome = if worker_token.is_cancelled() {
                    LoadOutcome::cancelled(&kind, format!("request {id} cancelled before start"))
                } else {
                    execute(&fetcher, &kind, &worker_token)
                };
                inflight.lock().remove(&id);
                deliver(&results, LoadResult { tag, outcome });
            });

        if let Err(error) = spawned {
            tracing::error!(request_id = id, %error, "failed to spawn loader thread");
            self.inflight.lock().remove(&id);
            let outcome = LoadOutcome::failed(
                &fallback.kind,
                CtuError::Runtime {
                    details: format!("failed to spawn loader thread: {error}"),
                },
            );
            deliver(
                &self.results,
                LoadResult {
                    tag: fallback.tag,
                    outcome,
                },
            );
        }
        token
    }

    /// Best-effort cancellation. The worker stops at its next checkpoint
    /// (before each fetch and before each cache write); a call already on
    /// the network runs to completion first.
    pub fn cancel(&self, tag: &RequestTag) -> bool {
        match self.inflight.lock().get(&tag.request_id) {
            Some(token) => {
                tracing::debug!(request_id = tag.request_id, "cancelling load");
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Requests that have not reported back yet.
    #[must_use]
    pub fn inflight(&self) -> usize {
        self.inflight.lock().len()
    }
}

fn execute(fetcher: &ResourceFetcher, kind: &LoadKind, cancel: &CancelToken) -> LoadOutcome {
    match kind {
        LoadKind::Children { level, parent_id } => {
            LoadOutcome::Children(fetcher.load_children(*level, parent_id.as_deref(), cancel))
        }
        LoadKind::Task { task_id } => LoadOutcome::Task(fetcher.load_task(task_id, cancel)),
        LoadKind::Refresh => LoadOutcome::Refreshed(fetcher.refresh_all(cancel)),
    }
}

/// Send one completion. Returns `false` when the receiver is gone.
fn deliver(results: &Sender<LoadResult>, result: LoadResult) -> bool {
    let request_id = result.tag.request_id;
    if results.send(result).is_err() {
        tracing::debug!(request_id, "result dropped; receiver gone");
        return false;
    }
    true
}
