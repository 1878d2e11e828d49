//! Navigation frames and the root-to-current path.

#![allow(missing_docs)]

use super::level::{HierarchyLevel, LEVEL_COUNT};
use crate::api::model::Resource;

/// One level's navigation state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationFrame {
    pub level: HierarchyLevel,
    /// Id selected in the parent frame that produced this one.
    pub parent_id: Option<String>,
    /// Id whose children the next frame shows (or whose detail is open).
    pub selected_id: Option<String>,
    /// `None` until the fetch completes. An empty vec is a valid result.
    pub children: Option<Vec<Resource>>,
    /// Highlighted row.
    pub cursor: usize,
    /// Parent's `selected_id` before this frame was pushed; restored on pop.
    pub(crate) parent_selection_before: Option<String>,
}

impl NavigationFrame {
    #[must_use]
    pub fn root() -> Self {
        Self::unresolved(HierarchyLevel::Workspace, None)
    }

    #[must_use]
    pub fn unresolved(level: HierarchyLevel, parent_id: Option<String>) -> Self {
        Self {
            level,
            parent_id,
            selected_id: None,
            children: None,
            cursor: 0,
            parent_selection_before: None,
        }
    }

    #[must_use]
    pub const fn is_resolved(&self) -> bool {
        self.children.is_some()
    }

    #[must_use]
    pub fn child(&self, id: &str) -> Option<&Resource> {
        self.children.as_deref()?.iter().find(|item| item.id() == id)
    }

    /// Resource under the cursor.
    #[must_use]
    pub fn highlighted(&self) -> Option<&Resource> {
        self.children.as_deref()?.get(self.cursor)
    }

    /// Move the cursor by `delta`, clamped to the loaded children.
    pub fn move_cursor(&mut self, delta: isize) {
        let len = self.children.as_ref().map_or(0, Vec::len);
        if len == 0 {
            self.cursor = 0;
            return;
        }
        self.cursor = self.cursor.saturating_add_signed(delta).min(len - 1);
    }

    /// Attach fetched children, keeping the cursor in range.
    pub fn resolve(&mut self, children: Vec<Resource>) {
        self.cursor = self.cursor.min(children.len().saturating_sub(1));
        self.children = Some(children);
    }
}

/// Stack of frames from the root to the active level.
///
/// Never empty; levels are contiguous starting at [`HierarchyLevel::Workspace`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationPath {
    frames: Vec<NavigationFrame>,
}

impl Default for NavigationPath {
    fn default() -> Self {
        Self::new()
    }
}

impl NavigationPath {
    #[must_use]
    pub fn new() -> Self {
        let mut frames = Vec::with_capacity(LEVEL_COUNT);
        frames.push(NavigationFrame::root());
        Self { frames }
    }

    #[must_use]
    pub fn frames(&self) -> &[NavigationFrame] {
        &self.frames
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Always false; present for API symmetry with `len`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    #[must_use]
    pub fn root(&self) -> &NavigationFrame {
        &self.frames[0]
    }

    #[must_use]
    pub fn active(&self) -> &NavigationFrame {
        let last = self.frames.len() - 1;
        &self.frames[last]
    }

    pub fn active_mut(&mut self) -> &mut NavigationFrame {
        let last = self.frames.len() - 1;
        &mut self.frames[last]
    }

    /// Frame directly below the active one.
    #[must_use]
    pub fn parent(&self) -> Option<&NavigationFrame> {
        self.frames.len().checked_sub(2).map(|idx| &self.frames[idx])
    }

    /// Push a child of the active frame for `selected_id`.
    ///
    /// Returns `false` without changing anything if the active level is
    /// terminal or `selected_id` is not one of its loaded children.
    pub fn descend(&mut self, selected_id: &str) -> bool {
        let active = self.active();
        let Some(next) = active.level.next() else {
            return false;
        };
        if active.child(selected_id).is_none() {
            return false;
        }

        let parent = self.active_mut();
        let before = parent.selected_id.replace(selected_id.to_string());
        let mut frame = NavigationFrame::unresolved(next, Some(selected_id.to_string()));
        frame.parent_selection_before = before;
        self.frames.push(frame);
        true
    }

    /// Pop the active frame, restoring the parent's prior selection.
    ///
    /// The root frame is never popped.
    pub fn ascend(&mut self) -> Option<NavigationFrame> {
        if self.frames.len() == 1 {
            return None;
        }
        let frame = self.frames.pop()?;
        self.active_mut()
            .selected_id
            .clone_from(&frame.parent_selection_before);
        Some(frame)
    }

    #[must_use]
    pub fn levels(&self) -> Vec<HierarchyLevel> {
        self.frames.iter().map(|frame| frame.level).collect()
    }

    #[must_use]
    pub fn selected_ids(&self) -> Vec<Option<String>> {
        self.frames
            .iter()
            .map(|frame| frame.selected_id.clone())
            .collect()
    }

    /// Root-first, gap-free, and within the hierarchy's depth.
    #[must_use]
    pub fn is_contiguous(&self) -> bool {
        !self.frames.is_empty()
            && self.frames.len() <= LEVEL_COUNT
            && self
                .frames
                .iter()
                .enumerate()
                .all(|(depth, frame)| frame.level.depth() == depth)
    }

    /// Breadcrumb of names selected along the path.
    #[must_use]
    pub fn breadcrumb(&self) -> Vec<&str> {
        self.frames
            .windows(2)
            .filter_map(|pair| {
                let id = pair[1].parent_id.as_deref()?;
                Some(pair[0].child(id).map_or(id, Resource::name))
            })
            .collect()
    }
}
