//! File logging setup.
//!
//! The terminal is owned by the UI while the app runs, so diagnostics go to an
//! append-only log file through a non-blocking writer. `RUST_LOG` wins over the
//! built-in filter when set.

#![allow(missing_docs)]

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::core::errors::{CtuError, Result};

const DEFAULT_FILTER: &str = "clickup_tui=info";
const DEBUG_FILTER: &str = "clickup_tui=debug";

/// Keeps the background writer alive. Dropping it flushes pending lines.
#[derive(Debug)]
pub struct LogGuard {
    path: PathBuf,
    worker: Option<WorkerGuard>,
}

impl LogGuard {
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether lines are actually reaching the file.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.worker.is_some()
    }
}

/// Filter directive for the given verbosity.
#[must_use]
pub fn filter_directive(debug: bool) -> &'static str {
    if debug { DEBUG_FILTER } else { DEFAULT_FILTER }
}

fn build_filter(debug: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter_directive(debug)))
}

/// Route `tracing` output to `path`, appending.
///
/// Fails only when the file cannot be opened. If a global subscriber is
/// already installed (tests, embedding), the existing one is kept and the
/// returned guard reports itself inactive.
pub fn init_file_logging(path: &Path, debug: bool) -> Result<LogGuard> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| CtuError::io(path, source))?;
    let (writer, worker) = tracing_appender::non_blocking(file);

    let installed = tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true)
                .with_filter(build_filter(debug)),
        )
        .try_init()
        .is_ok();

    Ok(LogGuard {
        path: path.to_path_buf(),
        worker: installed.then_some(worker),
    })
}
