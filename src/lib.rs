#![forbid(unsafe_code)]

//! clickup-tui: a terminal client for browsing ClickUp.
//!
//! Drill from workspaces through spaces, folders, and lists down to tasks.
//! Every collection fetched from the service is kept in a read-through file
//! cache so revisiting a level is instant and survives restarts.
//!
//! # Library usage
//!
//! Use the [`prelude`] for convenient access to the most common types:
//!
//! ```rust,no_run
//! use clickup_tui::prelude::*;
//! ```
//!
//! Individual modules can also be imported directly:
//!
//! ```rust,no_run
//! use clickup_tui::cache::ResourceCache;
//! use clickup_tui::navigator::{NavigationController, NavIntent};
//! ```

pub mod prelude;

pub mod api;
pub mod cache;
pub mod core;
pub mod logger;
pub mod navigator;
#[cfg(feature = "cli")]
pub mod tui;
