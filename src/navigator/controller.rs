//! Drill-down navigation state machine.
//!
//! The controller owns the [`NavigationPath`] and the single outstanding
//! request. Intents and load completions go in; [`NavCmd`] values describing
//! fetches, cancellations, and notices come out. Nothing here performs I/O.

#![allow(missing_docs)]

use super::level::HierarchyLevel;
use super::loader::{LoadKind, LoadOutcome, LoadRequest, LoadResult, RequestTag};
use super::path::{NavigationFrame, NavigationPath};
use crate::api::fetch::RefreshReport;
use crate::api::model::{Resource, Task};
use crate::core::errors::{CtuError, Result};

// ──────────────────── intents / commands ────────────────────

/// User-level navigation requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavIntent {
    Select(String),
    Back,
    /// Repeat the last failed load.
    Retry,
    /// Invalidate and re-populate the whole cache.
    Refresh,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

/// Side-effects for the runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavCmd {
    None,
    Load(LoadRequest),
    Cancel(RequestTag),
    /// The selected id at `level` was (re)set.
    SelectionChanged {
        level: HierarchyLevel,
        id: String,
    },
    Notify {
        level: NoticeLevel,
        message: String,
    },
    Batch(Vec<Self>),
}

impl NavCmd {
    fn batch(cmds: Vec<Self>) -> Self {
        let mut cmds: Vec<Self> = cmds.into_iter().filter(|c| *c != Self::None).collect();
        match cmds.len() {
            0 => Self::None,
            1 => cmds.remove(0),
            _ => Self::Batch(cmds),
        }
    }

    fn info(message: impl Into<String>) -> Self {
        Self::Notify {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self::Notify {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }

    /// Flatten nested batches into execution order.
    #[must_use]
    pub fn into_vec(self) -> Vec<Self> {
        match self {
            Self::None => Vec::new(),
            Self::Batch(cmds) => cmds.into_iter().flat_map(Self::into_vec).collect(),
            other => vec![other],
        }
    }
}

// ──────────────────── detail / retry ────────────────────

/// Single-task detail pane state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDetail {
    pub task_id: String,
    /// `None` while loading.
    pub task: Option<Task>,
    prior_selection: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum RetryTarget {
    ReloadActive,
    Select(String),
}

/// Active frame contents set aside while that frame reloads in place.
#[derive(Debug)]
struct Reload {
    request_id: u64,
    children: Option<Vec<Resource>>,
    cursor: usize,
}

// ──────────────────── controller ────────────────────

#[derive(Debug)]
pub struct NavigationController {
    path: NavigationPath,
    pending: Option<RequestTag>,
    next_request_id: u64,
    retry: Option<RetryTarget>,
    /// Set while the active frame reloads; a failure puts these back.
    reload: Option<Reload>,
    detail: Option<TaskDetail>,
    /// Consumed by the first successful workspace load.
    default_workspace: Option<String>,
}

impl NavigationController {
    #[must_use]
    pub fn new(default_workspace: Option<String>) -> Self {
        Self {
            path: NavigationPath::new(),
            pending: None,
            next_request_id: 0,
            retry: None,
            reload: None,
            detail: None,
            default_workspace,
        }
    }

    /// Initial workspace fetch.
    pub fn start(&mut self) -> NavCmd {
        tracing::info!("loading workspaces");
        self.reload_active()
    }

    #[must_use]
    pub const fn path(&self) -> &NavigationPath {
        &self.path
    }

    #[must_use]
    pub fn active(&self) -> &NavigationFrame {
        self.path.active()
    }

    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    #[must_use]
    pub const fn pending(&self) -> Option<&RequestTag> {
        self.pending.as_ref()
    }

    #[must_use]
    pub const fn detail(&self) -> Option<&TaskDetail> {
        self.detail.as_ref()
    }

    /// Whether `Retry` currently has something to repeat.
    #[must_use]
    pub fn can_retry(&self) -> bool {
        self.retry.is_some() || !self.path.active().is_resolved()
    }

    pub fn move_cursor(&mut self, delta: isize) {
        self.path.active_mut().move_cursor(delta);
    }

    #[must_use]
    pub fn highlighted_id(&self) -> Option<&str> {
        self.path.active().highlighted().map(Resource::id)
    }

    pub fn apply(&mut self, intent: NavIntent) -> NavCmd {
        match intent {
            NavIntent::Select(id) => self.select(id),
            NavIntent::Back => self.back(),
            NavIntent::Retry => self.retry(),
            NavIntent::Refresh => self.refresh(),
        }
    }

    /// Feed a completion back in. Results for anything but the outstanding
    /// request are dropped.
    pub fn on_loaded(&mut self, result: LoadResult) -> NavCmd {
        if self.pending.as_ref() != Some(&result.tag) {
            tracing::debug!(
                request_id = result.tag.request_id,
                level = %result.tag.level,
                "discarding stale load result"
            );
            return NavCmd::None;
        }
        self.pending = None;
        let reload = self
            .reload
            .take()
            .filter(|reload| reload.request_id == result.tag.request_id);

        match result.outcome {
            LoadOutcome::Children(Ok(items)) => self.attach_children(&result.tag, items),
            LoadOutcome::Children(Err(error)) => self.children_failed(&result.tag, &error, reload),
            LoadOutcome::Task(outcome) => self.task_loaded(&result.tag, outcome),
            LoadOutcome::Refreshed(outcome) => self.refreshed(outcome),
        }
    }

    // ── intents ──

    fn select(&mut self, id: String) -> NavCmd {
        if self.pending.is_some() {
            tracing::debug!(%id, "select ignored while loading");
            return NavCmd::info("Still loading, try again in a moment");
        }
        let active = self.path.active();
        let level = active.level;
        if active.child(&id).is_none() {
            tracing::debug!(%id, %level, "select ignored: not a loaded child");
            return NavCmd::None;
        }
        if level.is_terminal() {
            return self.open_task(id);
        }

        self.path.descend(&id);
        self.retry = None;
        let next = self.path.active().level;
        tracing::debug!(%id, from = %level, to = %next, "descending");
        let load = self.issue(
            next,
            Some(id.clone()),
            LoadKind::Children {
                level: next,
                parent_id: Some(id.clone()),
            },
        );
        NavCmd::batch(vec![NavCmd::SelectionChanged { level, id }, load])
    }

    fn open_task(&mut self, id: String) -> NavCmd {
        let frame = self.path.active_mut();
        let prior_selection = match &self.detail {
            Some(open) => open.prior_selection.clone(),
            None => frame.selected_id.clone(),
        };
        frame.selected_id = Some(id.clone());
        self.detail = Some(TaskDetail {
            task_id: id.clone(),
            task: None,
            prior_selection,
        });
        self.retry = None;
        let load = self.issue(
            HierarchyLevel::TaskCollection,
            Some(id.clone()),
            LoadKind::Task {
                task_id: id.clone(),
            },
        );
        NavCmd::batch(vec![
            NavCmd::SelectionChanged {
                level: HierarchyLevel::TaskCollection,
                id,
            },
            load,
        ])
    }

    fn back(&mut self) -> NavCmd {
        let cancel = |pending: &mut Option<RequestTag>| {
            pending.take().map_or(NavCmd::None, NavCmd::Cancel)
        };

        if let Some(detail) = self.detail.take() {
            tracing::debug!(task_id = %detail.task_id, "closing task detail");
            self.path.active_mut().selected_id = detail.prior_selection;
            return cancel(&mut self.pending);
        }
        if self.path.active().level.is_root() {
            tracing::debug!("back ignored at root");
            return NavCmd::None;
        }

        let cmd = cancel(&mut self.pending);
        self.retry = None;
        self.reload = None;
        if let Some(frame) = self.path.ascend() {
            tracing::debug!(from = %frame.level, "ascending");
        }
        cmd
    }

    fn retry(&mut self) -> NavCmd {
        if self.pending.is_some() {
            return NavCmd::info("Still loading, try again in a moment");
        }
        match self.retry.take() {
            Some(RetryTarget::Select(id)) => self.select(id),
            Some(RetryTarget::ReloadActive) => self.reload_active(),
            None if !self.path.active().is_resolved() => self.reload_active(),
            None => {
                tracing::debug!("nothing to retry");
                NavCmd::None
            }
        }
    }

    fn refresh(&mut self) -> NavCmd {
        if self.pending.is_some() {
            return NavCmd::info("Still loading, try again in a moment");
        }
        let active = self.path.active();
        let (level, parent) = (active.level, active.parent_id.clone());
        let load = self.issue(level, parent, LoadKind::Refresh);
        NavCmd::batch(vec![NavCmd::info("Refreshing cache..."), load])
    }

    // ── completions ──

    fn attach_children(&mut self, tag: &RequestTag, items: Vec<Resource>) -> NavCmd {
        let active = self.path.active_mut();
        if active.level != tag.level || active.parent_id != tag.parent_id {
            tracing::debug!(request_id = tag.request_id, "no frame for load result");
            return NavCmd::None;
        }
        tracing::info!(level = %tag.level, count = items.len(), "children loaded");
        active.resolve(items);
        self.retry = None;

        if active.level.is_root()
            && let Some(workspace) = self.default_workspace.take()
        {
            let position = active
                .children
                .as_deref()
                .and_then(|items| items.iter().position(|item| item.id() == workspace));
            if let Some(position) = position {
                active.cursor = position;
                tracing::info!(%workspace, "selecting default workspace");
                return self.select(workspace);
            }
            tracing::warn!(%workspace, "default workspace not found");
        }
        NavCmd::None
    }

    fn children_failed(&mut self, tag: &RequestTag, error: &CtuError, reload: Option<Reload>) -> NavCmd {
        tracing::error!(level = %tag.level, parent = ?tag.parent_id, %error, "load failed");
        let message = format!("Failed to load {}: {error}", tag.level.label().to_lowercase());

        if let Some(reload) = reload {
            // In-place reload: the frame goes back to what it showed before.
            let active = self.path.active_mut();
            active.children = reload.children;
            active.cursor = reload.cursor;
            self.retry = Some(RetryTarget::ReloadActive);
        } else if self.path.active().level.is_root() {
            self.retry = Some(RetryTarget::ReloadActive);
        } else {
            let popped = self.path.ascend();
            self.retry = popped
                .and_then(|frame| frame.parent_id)
                .map(RetryTarget::Select);
        }
        NavCmd::error(message)
    }

    fn task_loaded(&mut self, tag: &RequestTag, outcome: Result<Task>) -> NavCmd {
        let matches = self
            .detail
            .as_ref()
            .is_some_and(|detail| Some(&detail.task_id) == tag.parent_id.as_ref());
        if !matches {
            tracing::debug!(request_id = tag.request_id, "task detail closed; dropping result");
            return NavCmd::None;
        }

        match outcome {
            Ok(task) => {
                if let Some(detail) = self.detail.as_mut() {
                    detail.task = Some(task);
                }
                NavCmd::None
            }
            Err(error) => {
                tracing::error!(task = ?tag.parent_id, %error, "task load failed");
                if let Some(detail) = self.detail.take() {
                    self.path.active_mut().selected_id = detail.prior_selection;
                    self.retry = Some(RetryTarget::Select(detail.task_id));
                }
                NavCmd::error(format!("Failed to load task: {error}"))
            }
        }
    }

    fn refreshed(&mut self, outcome: Result<RefreshReport>) -> NavCmd {
        match outcome {
            Ok(report) if report.is_clean() => NavCmd::batch(vec![
                NavCmd::info(format!("Cache refreshed ({} entries)", report.refreshed)),
                self.reload_active(),
            ]),
            Ok(report) => NavCmd::batch(vec![
                NavCmd::error(format!(
                    "Cache refreshed with {} failure(s); {} entries updated",
                    report.failures.len(),
                    report.refreshed
                )),
                self.reload_active(),
            ]),
            Err(error) => {
                tracing::error!(%error, "cache refresh failed");
                NavCmd::error(format!("Cache refresh failed: {error}"))
            }
        }
    }

    // ── helpers ──

    fn reload_active(&mut self) -> NavCmd {
        let active = self.path.active_mut();
        let children = active.children.take();
        let cursor = active.cursor;
        let (level, parent) = (active.level, active.parent_id.clone());
        let cmd = self.issue(
            level,
            parent.clone(),
            LoadKind::Children {
                level,
                parent_id: parent,
            },
        );
        self.reload = Some(Reload {
            request_id: self.next_request_id,
            children,
            cursor,
        });
        cmd
    }

    fn issue(&mut self, level: HierarchyLevel, parent_id: Option<String>, kind: LoadKind) -> NavCmd {
        self.next_request_id += 1;
        let tag = RequestTag {
            request_id: self.next_request_id,
            level,
            parent_id,
        };
        self.pending = Some(tag.clone());
        NavCmd::Load(LoadRequest { tag, kind })
    }
}

// ──────────────────── tests ────────────────────
