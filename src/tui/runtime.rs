//! Event loop: terminal input, load completions, and ticks feed `update()`;
//! the returned commands are executed here.

#![allow(missing_docs)]

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender, select};
use crossterm::event::{self, Event};

use super::model::{AppCmd, AppModel, AppMsg};
use super::render::{compose_frame, paint};
use super::terminal_guard::TerminalGuard;
use super::update::{init, update};
use crate::api::fetch::ResourceFetcher;
use crate::core::errors::{CtuError, Result};
use crate::navigator::controller::NavigationController;
use crate::navigator::loader::{AsyncLoader, LoadResult};

pub const DEFAULT_TICK: Duration = Duration::from_millis(120);
const INPUT_POLL: Duration = Duration::from_millis(50);

/// Everything the event loop needs from the outside world.
#[derive(Debug, Clone)]
pub struct RuntimeContext {
    pub fetcher: Arc<ResourceFetcher>,
    pub default_workspace: Option<String>,
    pub tick: Duration,
}

impl RuntimeContext {
    #[must_use]
    pub fn new(fetcher: Arc<ResourceFetcher>, default_workspace: Option<String>) -> Self {
        Self {
            fetcher,
            default_workspace,
            tick: DEFAULT_TICK,
        }
    }
}

/// Run the navigator until the user quits.
///
/// # Errors
/// Returns [`CtuError::Runtime`] if the terminal cannot be driven and
/// [`CtuError::ChannelClosed`] if the input reader dies.
pub fn run(ctx: RuntimeContext) -> Result<()> {
    let guard = TerminalGuard::new().map_err(|e| terminal_error("setup", &e))?;

    let (load_tx, load_rx) = crossbeam_channel::unbounded();
    let (input_tx, input_rx) = crossbeam_channel::unbounded();
    let stop = Arc::new(AtomicBool::new(false));
    let input = spawn_input_reader(input_tx, Arc::clone(&stop))?;

    let mut effects = Effects::new(AsyncLoader::new(Arc::clone(&ctx.fetcher), load_tx));
    let model = AppModel::new(
        NavigationController::new(ctx.default_workspace),
        TerminalGuard::terminal_size(),
    );
    let outcome = event_loop(model, &mut effects, &input_rx, &load_rx, ctx.tick);

    stop.store(true, Ordering::SeqCst);
    if input.join().is_err() {
        tracing::warn!("input reader panicked");
    }
    drop(guard);
    tracing::info!(inflight = effects.loader.inflight(), "navigator stopped");
    outcome
}

fn event_loop(
    mut model: AppModel,
    effects: &mut Effects,
    input_rx: &Receiver<AppMsg>,
    load_rx: &Receiver<LoadResult>,
    tick: Duration,
) -> Result<()> {
    let ticker = crossbeam_channel::tick(tick);
    let mut stdout = io::stdout();

    let cmd = init(&mut model);
    if effects.execute(cmd) {
        return Ok(());
    }

    loop {
        paint(&mut stdout, &compose_frame(&model)).map_err(|e| terminal_error("draw", &e))?;

        let msg = select! {
            recv(input_rx) -> msg => msg.map_err(|_| CtuError::ChannelClosed { component: "input" })?,
            recv(load_rx) -> result => AppMsg::Loaded(
                result.map_err(|_| CtuError::ChannelClosed { component: "loader" })?,
            ),
            recv(ticker) -> _ => AppMsg::Tick,
        };

        if matches!(msg, AppMsg::Tick) && expire_due(&mut model, effects, Instant::now()) {
            return Ok(());
        }
        let cmd = update(&mut model, msg);
        if effects.execute(cmd) || model.quit {
            return Ok(());
        }
    }
}

/// Feed due notification expiries to `update`. Returns `true` on quit.
fn expire_due(model: &mut AppModel, effects: &mut Effects, now: Instant) -> bool {
    for id in effects.expiries.take_due(now) {
        let cmd = update(model, AppMsg::NotificationExpired(id));
        if effects.execute(cmd) {
            return true;
        }
    }
    false
}

fn terminal_error(stage: &str, error: &io::Error) -> CtuError {
    CtuError::Runtime {
        details: format!("terminal {stage} failed: {error}"),
    }
}

// ──────────────────── input reader ────────────────────

fn spawn_input_reader(tx: Sender<AppMsg>, stop: Arc<AtomicBool>) -> Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("ctu-input".to_string())
        .spawn(move || {
            while !stop.load(Ordering::SeqCst) {
                match event::poll(INPUT_POLL) {
                    Ok(false) => {}
                    Ok(true) => {
                        let msg = match event::read() {
                            Ok(Event::Key(key)) => AppMsg::Key(key),
                            Ok(Event::Resize(cols, rows)) => AppMsg::Resize { cols, rows },
                            Ok(_) => continue,
                            Err(error) => {
                                tracing::error!(%error, "terminal read failed");
                                return;
                            }
                        };
                        if tx.send(msg).is_err() {
                            return;
                        }
                    }
                    Err(error) => {
                        tracing::error!(%error, "terminal poll failed");
                        return;
                    }
                }
            }
        })
        .map_err(|e| CtuError::Runtime {
            details: format!("failed to spawn input reader: {e}"),
        })
}

// ──────────────────── effects ────────────────────

struct Effects {
    loader: AsyncLoader,
    expiries: ExpiryQueue,
}

impl Effects {
    const fn new(loader: AsyncLoader) -> Self {
        Self {
            loader,
            expiries: ExpiryQueue::new(),
        }
    }

    /// Execute a command tree. Returns `true` when the app should exit.
    fn execute(&mut self, cmd: AppCmd) -> bool {
        let mut quit = false;
        for cmd in cmd.into_vec() {
            match cmd {
                AppCmd::None | AppCmd::Batch(_) => {}
                AppCmd::Quit => quit = true,
                AppCmd::Load(request) => {
                    let _ = self.loader.submit(request);
                }
                AppCmd::Cancel(tag) => {
                    if !self.loader.cancel(&tag) {
                        tracing::debug!(request_id = tag.request_id, "cancel: request already finished");
                    }
                }
                AppCmd::ScheduleNotificationExpiry { id, after } => {
                    self.expiries.schedule(id, Instant::now() + after);
                }
            }
        }
        quit
    }
}

/// Notification deadlines, checked on every tick.
#[derive(Debug, Default)]
struct ExpiryQueue {
    deadlines: Vec<(Instant, u64)>,
}

impl ExpiryQueue {
    const fn new() -> Self {
        Self {
            deadlines: Vec::new(),
        }
    }

    fn schedule(&mut self, id: u64, at: Instant) {
        self.deadlines.push((at, id));
    }

    fn take_due(&mut self, now: Instant) -> Vec<u64> {
        let mut due = Vec::new();
        self.deadlines.retain(|&(at, id)| {
            if at <= now {
                due.push(id);
                false
            } else {
                true
            }
        });
        due
    }
}

// ──────────────────── tests ────────────────────
