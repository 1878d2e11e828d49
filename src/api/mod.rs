//! Remote service access: resource types, HTTP client, cache-backed fetching.

pub mod client;
pub mod fetch;
pub mod model;

pub use client::{HttpResourceClient, ResourceClient};
pub use fetch::{RefreshReport, ResourceFetcher};
pub use model::{Folder, List, Resource, Space, Task, Workspace};
