//! Hierarchical navigation: levels, frames, the controller, and the loader
//! that runs its fetches in the background.

pub mod controller;
pub mod level;
pub mod loader;
pub mod path;

#[cfg(test)]
mod test_properties;

pub use controller::{NavCmd, NavIntent, NavigationController, NoticeLevel, TaskDetail};
pub use level::HierarchyLevel;
pub use loader::{AsyncLoader, CancelToken, LoadKind, LoadOutcome, LoadRequest, LoadResult, RequestTag};
pub use path::{NavigationFrame, NavigationPath};
