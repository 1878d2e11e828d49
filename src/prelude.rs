//! Convenience re-exports for library consumers.
//!
//! ```rust,no_run
//! use clickup_tui::prelude::*;
//! ```

// Core
pub use crate::core::config::Config;
pub use crate::core::errors::{CtuError, Result};

// Cache
pub use crate::cache::{CacheEntry, CacheFlushGuard, CacheKey, ResourceCache};

// Remote service
pub use crate::api::{
    Folder, HttpResourceClient, List, RefreshReport, Resource, ResourceClient, ResourceFetcher,
    Space, Task, Workspace,
};

// Navigation
pub use crate::navigator::{
    AsyncLoader, HierarchyLevel, LoadRequest, LoadResult, NavCmd, NavIntent, NavigationController,
    NavigationPath,
};
