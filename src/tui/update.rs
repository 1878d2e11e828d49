//! Pure update function for the navigator UI.
//!
//! `update()` takes the current model and a message, mutates the model, and
//! returns a command describing any side-effects the runtime should execute.

use crossterm::event::KeyEventKind;

use super::input::{InputAction, InputContext, resolve_key_event};
use super::model::{AppCmd, AppModel, AppMsg, NotificationLevel, Overlay};
use crate::navigator::controller::{NavCmd, NavIntent, NoticeLevel};

/// Apply a message to the model and return the next command for the runtime.
pub fn update(model: &mut AppModel, msg: AppMsg) -> AppCmd {
    match msg {
        AppMsg::Tick => {
            model.tick = model.tick.wrapping_add(1);
            AppCmd::None
        }

        AppMsg::Key(key) => {
            if key.kind == KeyEventKind::Release {
                return AppCmd::None;
            }
            let context = InputContext {
                active_overlay: model.overlay,
            };
            resolve_key_event(&key, context)
                .action
                .map_or(AppCmd::None, |action| apply_input_action(model, action))
        }

        AppMsg::Resize { cols, rows } => {
            model.terminal_size = (cols, rows);
            AppCmd::None
        }

        AppMsg::Loaded(result) => {
            let cmd = model.nav.on_loaded(result);
            dispatch(model, cmd)
        }

        AppMsg::NotificationExpired(id) => {
            model.notifications.retain(|n| n.id != id);
            AppCmd::None
        }
    }
}

/// Initial command: kick off the workspace load.
pub fn init(model: &mut AppModel) -> AppCmd {
    let cmd = model.nav.start();
    dispatch(model, cmd)
}

fn apply_input_action(model: &mut AppModel, action: InputAction) -> AppCmd {
    match action {
        InputAction::Quit => {
            model.quit = true;
            AppCmd::Quit
        }
        InputAction::ToggleOverlay(overlay) => {
            model.overlay = if model.overlay == Some(overlay) {
                None
            } else {
                Some(overlay)
            };
            AppCmd::None
        }
        InputAction::CloseOverlay => {
            model.overlay = None;
            AppCmd::None
        }
        InputAction::CursorUp => move_cursor(model, -1),
        InputAction::CursorDown => move_cursor(model, 1),
        InputAction::CursorTop => move_cursor(model, isize::MIN),
        InputAction::CursorBottom => move_cursor(model, isize::MAX),
        InputAction::Select => {
            let Some(id) = model.nav.highlighted_id().map(str::to_string) else {
                tracing::debug!("select with nothing highlighted");
                return AppCmd::None;
            };
            navigate(model, NavIntent::Select(id))
        }
        InputAction::Back => navigate(model, NavIntent::Back),
        InputAction::Retry => navigate(model, NavIntent::Retry),
        InputAction::Refresh => navigate(model, NavIntent::Refresh),
    }
}

fn move_cursor(model: &mut AppModel, delta: isize) -> AppCmd {
    // The detail pane owns the screen; the list underneath stays put.
    if model.nav.detail().is_none() {
        model.nav.move_cursor(delta);
    }
    AppCmd::None
}

fn navigate(model: &mut AppModel, intent: NavIntent) -> AppCmd {
    let cmd = model.nav.apply(intent);
    dispatch(model, cmd)
}

/// Translate controller commands into runtime commands.
fn dispatch(model: &mut AppModel, cmd: NavCmd) -> AppCmd {
    match cmd {
        NavCmd::None => AppCmd::None,
        NavCmd::Load(request) => AppCmd::Load(request),
        NavCmd::Cancel(tag) => AppCmd::Cancel(tag),
        NavCmd::SelectionChanged { level, id } => {
            tracing::debug!(%level, %id, "selection changed");
            model.last_selection = Some((level, id));
            AppCmd::None
        }
        NavCmd::Notify { level, message } => {
            let level = match level {
                NoticeLevel::Info => NotificationLevel::Info,
                NoticeLevel::Error => NotificationLevel::Error,
            };
            let id = model.push_notification(level, message);
            AppCmd::ScheduleNotificationExpiry {
                id,
                after: level.ttl(),
            }
        }
        NavCmd::Batch(cmds) => {
            let cmds: Vec<AppCmd> = cmds
                .into_iter()
                .map(|cmd| dispatch(model, cmd))
                .filter(|cmd| *cmd != AppCmd::None)
                .collect();
            if cmds.is_empty() {
                AppCmd::None
            } else {
                AppCmd::Batch(cmds)
            }
        }
    }
}

/// Whether the help overlay is showing.
#[must_use]
pub fn help_visible(model: &AppModel) -> bool {
    model.overlay == Some(Overlay::Help)
}

// ──────────────────── tests ────────────────────
