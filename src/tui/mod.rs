//! Terminal front end: Elm-style model/update/render over the navigator,
//! with crossterm driving the terminal.

#![allow(missing_docs)]

pub mod input;
pub mod model;
pub mod render;
pub mod runtime;
pub mod terminal_guard;
pub mod update;

pub use runtime::{RuntimeContext, run};
