//! Key routing: overlay keys first, then global navigation keys.

#![allow(missing_docs)]

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use super::model::Overlay;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputContext {
    pub active_overlay: Option<Overlay>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputAction {
    Quit,
    CursorUp,
    CursorDown,
    CursorTop,
    CursorBottom,
    Select,
    Back,
    Retry,
    Refresh,
    ToggleOverlay(Overlay),
    CloseOverlay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputResolution {
    pub action: Option<InputAction>,
    pub consumed: bool,
}

impl InputResolution {
    const fn action(action: InputAction) -> Self {
        Self {
            action: Some(action),
            consumed: true,
        }
    }

    const fn consumed_without_action() -> Self {
        Self {
            action: None,
            consumed: true,
        }
    }

    const fn passthrough() -> Self {
        Self {
            action: None,
            consumed: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HelpBinding {
    pub keys: &'static str,
    pub description: &'static str,
}

const HELP_BINDINGS: [HelpBinding; 8] = [
    HelpBinding {
        keys: "j / Down",
        description: "Move down",
    },
    HelpBinding {
        keys: "k / Up",
        description: "Move up",
    },
    HelpBinding {
        keys: "g / G",
        description: "Jump to first / last",
    },
    HelpBinding {
        keys: "Enter / l",
        description: "Open the highlighted item",
    },
    HelpBinding {
        keys: "Esc / h / Backspace",
        description: "Go back (closes task detail first)",
    },
    HelpBinding {
        keys: "r",
        description: "Retry the last failed load",
    },
    HelpBinding {
        keys: "R",
        description: "Refresh every cached entry",
    },
    HelpBinding {
        keys: "? / q / Ctrl-C",
        description: "Toggle help / quit",
    },
];

#[must_use]
pub const fn help_bindings() -> &'static [HelpBinding] {
    &HELP_BINDINGS
}

/// Resolve a key event using deterministic precedence rules:
/// overlay keys first, then global keys.
#[must_use]
pub fn resolve_key_event(key: &KeyEvent, context: InputContext) -> InputResolution {
    if is_ctrl_c(key) {
        return InputResolution::action(InputAction::Quit);
    }
    if let Some(overlay) = context.active_overlay {
        return resolve_overlay_key(key, overlay);
    }
    resolve_global_key(key)
}

fn is_ctrl_c(key: &KeyEvent) -> bool {
    key.modifiers.contains(KeyModifiers::CONTROL) && matches!(key.code, KeyCode::Char('c'))
}

fn resolve_overlay_key(key: &KeyEvent, overlay: Overlay) -> InputResolution {
    match (overlay, key.code) {
        (Overlay::Help, KeyCode::Char('?')) => {
            InputResolution::action(InputAction::ToggleOverlay(Overlay::Help))
        }
        (_, KeyCode::Esc | KeyCode::Char('q')) => InputResolution::action(InputAction::CloseOverlay),
        _ => InputResolution::consumed_without_action(),
    }
}

fn resolve_global_key(key: &KeyEvent) -> InputResolution {
    let action = match key.code {
        KeyCode::Char('q') => InputAction::Quit,
        KeyCode::Char('j') | KeyCode::Down => InputAction::CursorDown,
        KeyCode::Char('k') | KeyCode::Up => InputAction::CursorUp,
        KeyCode::Char('g') | KeyCode::Home => InputAction::CursorTop,
        KeyCode::Char('G') | KeyCode::End => InputAction::CursorBottom,
        KeyCode::Enter | KeyCode::Char('l') | KeyCode::Right => InputAction::Select,
        KeyCode::Esc | KeyCode::Char('h') | KeyCode::Backspace | KeyCode::Left => InputAction::Back,
        KeyCode::Char('r') => InputAction::Retry,
        KeyCode::Char('R') => InputAction::Refresh,
        KeyCode::Char('?') => InputAction::ToggleOverlay(Overlay::Help),
        _ => return InputResolution::passthrough(),
    };
    InputResolution::action(action)
}
