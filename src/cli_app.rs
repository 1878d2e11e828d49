//! CLI definition and bootstrap for `clickup-tui`.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::{Shell as CompletionShell, generate};
use colored::Colorize;
use thiserror::Error;

use clickup_tui::api::{HttpResourceClient, ResourceFetcher};
use clickup_tui::cache::{CacheFlushGuard, ResourceCache};
use clickup_tui::core::config::Config;
use clickup_tui::core::errors::CtuError;
use clickup_tui::core::paths::{prepare_cache_root, prepare_log_file};
use clickup_tui::logger::{LogGuard, init_file_logging};
use clickup_tui::tui::{self, RuntimeContext};

/// Browse ClickUp workspaces, spaces, folders, lists, and tasks from the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "clickup-tui",
    author,
    version,
    about = "Terminal client for ClickUp",
    long_about = None
)]
pub struct Cli {
    /// Override config file path.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Override the cache directory.
    #[arg(long, value_name = "DIR")]
    cache_path: Option<PathBuf>,
    /// Override the log file.
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,
    /// Log at debug level.
    #[arg(long)]
    debug: bool,
    /// Clear the cache before starting.
    #[arg(long, conflicts_with = "clean_cache_only")]
    clean_cache: bool,
    /// Clear the cache and exit without starting the UI.
    #[arg(long)]
    clean_cache_only: bool,
    /// Subcommand to execute instead of the UI.
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Generate shell completion scripts.
    Completions(CompletionsArgs),
    /// Show version and build metadata.
    Version(VersionArgs),
}

#[derive(Debug, Clone, Args)]
struct CompletionsArgs {
    /// Shell to generate completion script for.
    #[arg(value_enum)]
    shell: CompletionShell,
}

#[derive(Debug, Clone, Args, Default)]
struct VersionArgs {
    /// Include additional build metadata fields.
    #[arg(long)]
    verbose: bool,
}

/// Top-level CLI error type with an exit-code contract.
#[derive(Debug, Error)]
pub enum CliError {
    /// Invalid user input or configuration.
    #[error("{0}")]
    User(String),
    /// Environment/runtime failure.
    #[error("{0}")]
    Runtime(String),
    /// Internal bug or invariant violation.
    #[error("{0}")]
    Internal(String),
    /// Output write failed.
    #[error("failed to write output: {0}")]
    Io(#[from] io::Error),
}

impl CliError {
    /// Process exit code contract for the CLI.
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::User(_) => 1,
            Self::Runtime(_) | Self::Io(_) => 2,
            Self::Internal(_) => 3,
        }
    }
}

impl From<CtuError> for CliError {
    fn from(error: CtuError) -> Self {
        match error {
            CtuError::InvalidConfig { .. }
            | CtuError::MissingConfig { .. }
            | CtuError::ConfigParse { .. }
            | CtuError::MissingToken { .. } => Self::User(error.to_string()),
            CtuError::ChannelClosed { .. } => Self::Internal(error.to_string()),
            other => Self::Runtime(other.to_string()),
        }
    }
}

/// Dispatch subcommands, or launch the navigator when none is given.
pub fn run(cli: &Cli) -> Result<(), CliError> {
    match &cli.command {
        Some(Command::Completions(args)) => {
            let mut command = Cli::command();
            let binary_name = command.get_name().to_string();
            generate(args.shell, &mut command, binary_name, &mut io::stdout());
            Ok(())
        }
        Some(Command::Version(args)) => {
            emit_version(args);
            Ok(())
        }
        None => launch(cli),
    }
}

fn launch(cli: &Cli) -> Result<(), CliError> {
    let mut config = Config::load(cli.config.as_deref())?;
    apply_overrides(&mut config, cli);

    let _log = start_logging(&config, cli.debug);
    let cache_root = prepare_cache_root(&config.cache.dir).inspect_err(|error| {
        tracing::error!(%error, "cache directory unusable; aborting");
    })?;
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        cache = %cache_root.display(),
        "starting"
    );

    let cache = Arc::new(ResourceCache::new(cache_root));
    if cli.clean_cache || cli.clean_cache_only {
        cache.invalidate()?;
        tracing::info!("cache cleared");
        if cli.clean_cache_only {
            println!("Cache cleared: {}", cache.root().display());
            return Ok(());
        }
    }

    match cache.load() {
        Ok(count) => tracing::info!(entries = count, "cache warmed"),
        Err(error) => tracing::warn!(%error, "cache warm load failed; continuing cold"),
    }

    let client = HttpResourceClient::from_config(&config)?;
    let guard = CacheFlushGuard::new(cache);
    let fetcher = Arc::new(ResourceFetcher::new(
        Arc::clone(guard.cache()),
        Arc::new(client),
    ));

    tui::run(RuntimeContext::new(fetcher, config.defaults.workspace.clone()))?;
    Ok(())
}

fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(dir) = &cli.cache_path {
        config.cache.dir.clone_from(dir);
    }
    if let Some(file) = &cli.log_file {
        config.paths.log_file.clone_from(file);
    }
}

/// Logging is best effort: the UI still starts when the file can't be opened.
fn start_logging(config: &Config, debug: bool) -> Option<LogGuard> {
    let result = prepare_log_file(&config.paths.log_file)
        .and_then(|path| init_file_logging(&path, debug));
    match result {
        Ok(guard) => Some(guard),
        Err(error) => {
            eprintln!("{} logging disabled: {error}", "warning:".yellow().bold());
            None
        }
    }
}

fn emit_version(args: &VersionArgs) {
    let version = env!("CARGO_PKG_VERSION");
    println!("clickup-tui {version}");
    if args.verbose {
        println!("package: {}", env!("CARGO_PKG_NAME"));
        println!("target: {}", option_env!("TARGET").unwrap_or("unknown"));
        println!("profile: {}", option_env!("PROFILE").unwrap_or("unknown"));
        println!(
            "git_sha: {}",
            option_env!("GIT_SHA").unwrap_or("unknown")
        );
    }
}

// ──────────────────── tests ────────────────────
