//! Property-based tests for navigation invariants.
//!
//! Arbitrary intent sequences run against a synthetic hierarchy. Loads are
//! either completed immediately, completed late, or left pending, so stale
//! results and cancellation get exercised alongside ordinary drill-down.

use proptest::prelude::*;

use super::controller::{NavCmd, NavIntent, NavigationController};
use super::level::{HierarchyLevel, LEVEL_COUNT};
use super::loader::{LoadKind, LoadOutcome, LoadRequest, LoadResult};
use crate::api::model::{Folder, List, Resource, Space, Task, TaskStatus, Workspace};
use crate::core::errors::CtuError;

// ──────────────────── synthetic hierarchy ────────────────────

/// Every parent has children `<parent>-0 .. <parent>-(fanout-1)`; fanout 0
/// for ids ending in `-2` gives empty collections somewhere in most runs.
fn children_of(level: HierarchyLevel, parent: Option<&str>) -> Vec<Resource> {
    let parent = parent.unwrap_or("root");
    let fanout = if parent.ends_with("-2") { 0 } else { 3 };
    (0..fanout)
        .map(|i| {
            let id = format!("{parent}-{i}");
            let name = format!("{level} {i}");
            match level {
                HierarchyLevel::Workspace => Resource::Workspace(Workspace {
                    id,
                    name,
                    color: None,
                }),
                HierarchyLevel::Space => Resource::Space(Space {
                    id,
                    name,
                    private: false,
                }),
                HierarchyLevel::Folder => Resource::Folder(Folder {
                    id,
                    name,
                    hidden: false,
                    task_count: None,
                }),
                HierarchyLevel::List => Resource::List(List {
                    id,
                    name,
                    content: None,
                    task_count: None,
                    archived: false,
                }),
                HierarchyLevel::TaskCollection => Resource::Task(task(&id)),
            }
        })
        .collect()
}

fn task(id: &str) -> Task {
    Task {
        id: id.to_string(),
        name: id.to_string(),
        status: TaskStatus::default(),
        description: None,
        creator: None,
        url: None,
        date_created: None,
        date_updated: None,
    }
}

fn complete(request: &LoadRequest, fail: bool) -> LoadResult {
    let error = || CtuError::Transport {
        endpoint: "/synthetic".into(),
        details: "injected".into(),
    };
    let outcome = match &request.kind {
        LoadKind::Children { level, parent_id } => LoadOutcome::Children(if fail {
            Err(error())
        } else {
            Ok(children_of(*level, parent_id.as_deref()))
        }),
        LoadKind::Task { task_id } => {
            LoadOutcome::Task(if fail { Err(error()) } else { Ok(task(task_id)) })
        }
        LoadKind::Refresh => LoadOutcome::Refreshed(Ok(Default::default())),
    };
    LoadResult {
        tag: request.tag.clone(),
        outcome,
    }
}

// ──────────────────── strategies ────────────────────

#[derive(Debug, Clone)]
enum Step {
    /// Select the child at this index (modulo the loaded count).
    SelectNth(usize),
    SelectUnknown,
    Back,
    Retry,
    Refresh,
    /// Deliver the oldest undelivered load.
    Deliver { fail: bool },
    /// Deliver a load that was already superseded, if any.
    DeliverStale,
}

fn arb_step() -> impl Strategy<Value = Step> {
    prop_oneof![
        4 => (0usize..4).prop_map(Step::SelectNth),
        1 => Just(Step::SelectUnknown),
        3 => Just(Step::Back),
        1 => Just(Step::Retry),
        1 => Just(Step::Refresh),
        4 => Just(Step::Deliver { fail: false }),
        1 => Just(Step::Deliver { fail: true }),
        1 => Just(Step::DeliverStale),
    ]
}

struct Harness {
    ctl: NavigationController,
    queue: Vec<LoadRequest>,
    delivered: Vec<LoadRequest>,
}

impl Harness {
    fn new() -> Self {
        let mut ctl = NavigationController::new(None);
        let cmd = ctl.start();
        let mut harness = Self {
            ctl,
            queue: Vec::new(),
            delivered: Vec::new(),
        };
        harness.absorb(cmd);
        harness
    }

    fn absorb(&mut self, cmd: NavCmd) {
        for cmd in cmd.into_vec() {
            if let NavCmd::Load(request) = cmd {
                self.queue.push(request);
            }
        }
    }

    fn run(&mut self, step: &Step) {
        let cmd = match step {
            Step::SelectNth(n) => {
                let id = self.ctl.active().children.as_ref().and_then(|items| {
                    (!items.is_empty()).then(|| items[n % items.len()].id().to_string())
                });
                id.map_or(NavCmd::None, |id| self.ctl.apply(NavIntent::Select(id)))
            }
            Step::SelectUnknown => self.ctl.apply(NavIntent::Select("no-such-id".into())),
            Step::Back => self.ctl.apply(NavIntent::Back),
            Step::Retry => self.ctl.apply(NavIntent::Retry),
            Step::Refresh => self.ctl.apply(NavIntent::Refresh),
            Step::Deliver { fail } => {
                if self.queue.is_empty() {
                    NavCmd::None
                } else {
                    let request = self.queue.remove(0);
                    let result = complete(&request, *fail);
                    self.delivered.push(request);
                    self.ctl.on_loaded(result)
                }
            }
            Step::DeliverStale => match self.delivered.first() {
                Some(request) => {
                    let result = complete(request, false);
                    self.ctl.on_loaded(result)
                }
                None => NavCmd::None,
            },
        };
        self.absorb(cmd);
    }
}

fn assert_contiguous(ctl: &NavigationController) {
    let levels = ctl.path().levels();
    assert!(!levels.is_empty());
    assert!(levels.len() <= LEVEL_COUNT);
    for (depth, level) in levels.iter().enumerate() {
        assert_eq!(level.depth(), depth, "gap in path: {levels:?}");
    }
    assert!(ctl.path().is_contiguous());
    if let Some(pending) = ctl.pending() {
        assert!(pending.level <= ctl.active().level);
    }
}

// ──────────────────── properties ────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn path_stays_contiguous(steps in prop::collection::vec(arb_step(), 1..80)) {
        let mut harness = Harness::new();
        for step in &steps {
            harness.run(step);
            assert_contiguous(&harness.ctl);
        }
    }

    #[test]
    fn back_undoes_select(steps in prop::collection::vec(arb_step(), 0..40), pick in 0usize..4) {
        let mut harness = Harness::new();
        for step in &steps {
            harness.run(step);
        }
        // Settle so a select can advance.
        while !harness.queue.is_empty() {
            harness.run(&Step::Deliver { fail: false });
        }
        if harness.ctl.detail().is_some() {
            harness.run(&Step::Back);
        }

        let before = harness.ctl.path().clone();
        let depth = before.len();
        harness.run(&Step::SelectNth(pick));
        if harness.ctl.path().len() == depth + 1 {
            // Inverse holds whether or not the child load completed.
            if pick % 2 == 0 {
                harness.run(&Step::Deliver { fail: false });
            }
            harness.run(&Step::Back);
            prop_assert_eq!(harness.ctl.path().selected_ids(), before.selected_ids());
            prop_assert_eq!(harness.ctl.path().levels(), before.levels());
            prop_assert!(!harness.ctl.is_loading());
        }
    }

    #[test]
    fn stale_results_never_change_state(steps in prop::collection::vec(arb_step(), 1..60)) {
        let mut harness = Harness::new();
        for step in &steps {
            harness.run(step);
        }
        if let Some(stale) = harness.delivered.first().cloned() {
            let before = harness.ctl.path().clone();
            let cmd = harness.ctl.on_loaded(complete(&stale, false));
            prop_assert_eq!(cmd, NavCmd::None);
            prop_assert_eq!(harness.ctl.path(), &before);
        }
    }
}
