//! The five-level resource hierarchy.

#![allow(missing_docs)]

use serde::{Deserialize, Serialize};

use crate::cache::namespace;

/// One level of the drill-down hierarchy, ordered parent → child.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum HierarchyLevel {
    #[default]
    Workspace,
    Space,
    Folder,
    List,
    TaskCollection,
}

/// Number of levels; also the maximum navigation depth.
pub const LEVEL_COUNT: usize = 5;

impl HierarchyLevel {
    pub const ALL: [Self; LEVEL_COUNT] = [
        Self::Workspace,
        Self::Space,
        Self::Folder,
        Self::List,
        Self::TaskCollection,
    ];

    /// Child level, or `None` for the task collection.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Workspace => Some(Self::Space),
            Self::Space => Some(Self::Folder),
            Self::Folder => Some(Self::List),
            Self::List => Some(Self::TaskCollection),
            Self::TaskCollection => None,
        }
    }

    /// Parent level, or `None` for the root.
    #[must_use]
    pub const fn prev(self) -> Option<Self> {
        match self {
            Self::Workspace => None,
            Self::Space => Some(Self::Workspace),
            Self::Folder => Some(Self::Space),
            Self::List => Some(Self::Folder),
            Self::TaskCollection => Some(Self::List),
        }
    }

    /// Zero-based position in the hierarchy.
    #[must_use]
    pub const fn depth(self) -> usize {
        match self {
            Self::Workspace => 0,
            Self::Space => 1,
            Self::Folder => 2,
            Self::List => 3,
            Self::TaskCollection => 4,
        }
    }

    #[must_use]
    pub const fn is_root(self) -> bool {
        matches!(self, Self::Workspace)
    }

    /// Selecting at a terminal level opens a detail view instead of descending.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::TaskCollection)
    }

    /// Plural heading used in the UI.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Workspace => "Workspaces",
            Self::Space => "Spaces",
            Self::Folder => "Folders",
            Self::List => "Lists",
            Self::TaskCollection => "Tasks",
        }
    }

    /// Cache namespace holding this level's collections.
    #[must_use]
    pub const fn namespace(self) -> &'static str {
        match self {
            Self::Workspace => namespace::TEAMS,
            Self::Space => namespace::SPACES,
            Self::Folder => namespace::FOLDERS,
            Self::List => namespace::LISTS,
            Self::TaskCollection => namespace::TASKS,
        }
    }

    /// Inverse of [`HierarchyLevel::namespace`].
    #[must_use]
    pub fn from_namespace(ns: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|level| level.namespace() == ns)
    }
}

impl std::fmt::Display for HierarchyLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Workspace => "workspace",
            Self::Space => "space",
            Self::Folder => "folder",
            Self::List => "list",
            Self::TaskCollection => "task_collection",
        };
        f.write_str(name)
    }
}
