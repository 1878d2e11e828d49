//! Elm-style state model for the navigator UI.
//!
//! All display state lives in [`AppModel`]. Input and load completions arrive
//! as [`AppMsg`] values; side-effects are returned as [`AppCmd`] values from
//! the update function.

#![allow(missing_docs)]

use std::time::Duration;

use crossterm::event::KeyEvent;

use crate::navigator::controller::NavigationController;
use crate::navigator::level::HierarchyLevel;
use crate::navigator::loader::{LoadRequest, LoadResult, RequestTag};

/// Maximum toasts kept at once; the oldest is evicted first.
pub const MAX_NOTIFICATIONS: usize = 3;
pub const INFO_TTL: Duration = Duration::from_secs(5);
pub const ERROR_TTL: Duration = Duration::from_secs(10);

// ──────────────────── notifications ────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub id: u64,
    pub level: NotificationLevel,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Error,
}

impl NotificationLevel {
    #[must_use]
    pub const fn ttl(self) -> Duration {
        match self {
            Self::Info => INFO_TTL,
            Self::Error => ERROR_TTL,
        }
    }
}

// ──────────────────── overlays ────────────────────

/// Surfaces drawn over the active frame. Only one at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overlay {
    Help,
}

// ──────────────────── model ────────────────────

#[derive(Debug)]
pub struct AppModel {
    pub nav: NavigationController,
    pub overlay: Option<Overlay>,
    /// Oldest first, at most [`MAX_NOTIFICATIONS`].
    pub notifications: Vec<Notification>,
    pub next_notification_id: u64,
    /// Columns, rows.
    pub terminal_size: (u16, u16),
    /// Drives the spinner.
    pub tick: u64,
    pub quit: bool,
    /// Most recent selection reported by the controller.
    pub last_selection: Option<(HierarchyLevel, String)>,
}

impl AppModel {
    #[must_use]
    pub fn new(nav: NavigationController, terminal_size: (u16, u16)) -> Self {
        Self {
            nav,
            overlay: None,
            notifications: Vec::new(),
            next_notification_id: 0,
            terminal_size,
            tick: 0,
            quit: false,
            last_selection: None,
        }
    }

    /// Push a notification, evicting the oldest if at capacity.
    /// Returns the assigned id.
    pub fn push_notification(&mut self, level: NotificationLevel, message: String) -> u64 {
        let id = self.next_notification_id;
        self.next_notification_id += 1;
        self.notifications.push(Notification { id, level, message });
        while self.notifications.len() > MAX_NOTIFICATIONS {
            self.notifications.remove(0);
        }
        id
    }
}

// ──────────────────── messages ────────────────────

#[derive(Debug)]
pub enum AppMsg {
    /// Periodic timer tick; advances the spinner.
    Tick,
    Key(KeyEvent),
    Resize { cols: u16, rows: u16 },
    Loaded(LoadResult),
    NotificationExpired(u64),
}

// ──────────────────── commands ────────────────────

/// Side-effects for the runtime. The update function never performs I/O.
#[derive(Debug, PartialEq, Eq)]
pub enum AppCmd {
    None,
    Quit,
    Batch(Vec<Self>),
    Load(LoadRequest),
    Cancel(RequestTag),
    ScheduleNotificationExpiry { id: u64, after: Duration },
}

impl AppCmd {
    /// Flatten nested batches into execution order.
    #[must_use]
    pub fn into_vec(self) -> Vec<Self> {
        match self {
            Self::None => Vec::new(),
            Self::Batch(cmds) => cmds.into_iter().flat_map(Self::into_vec).collect(),
            other => vec![other],
        }
    }
}

// ──────────────────── tests ────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn test_model() -> AppModel {
        AppModel::new(NavigationController::new(None), (80, 24))
    }

    #[test]
    fn push_notification_evicts_oldest() {
        let mut model = test_model();
        model.push_notification(NotificationLevel::Info, "a".into());
        model.push_notification(NotificationLevel::Info, "b".into());
        model.push_notification(NotificationLevel::Info, "c".into());
        assert_eq!(model.notifications.len(), 3);

        let id = model.push_notification(NotificationLevel::Error, "d".into());
        assert_eq!(model.notifications.len(), 3);
        assert_eq!(model.notifications[0].message, "b");
        assert_eq!(model.notifications[2].id, id);
    }

    #[test]
    fn notification_ids_are_monotonic() {
        let mut model = test_model();
        let id1 = model.push_notification(NotificationLevel::Info, "x".into());
        let id2 = model.push_notification(NotificationLevel::Info, "y".into());
        assert_eq!(id2, id1 + 1);
    }

    #[test]
    fn errors_outlive_info() {
        assert!(NotificationLevel::Error.ttl() > NotificationLevel::Info.ttl());
    }

    #[test]
    fn cmd_flatten() {
        let cmd = AppCmd::Batch(vec![
            AppCmd::None,
            AppCmd::Batch(vec![AppCmd::Quit]),
            AppCmd::ScheduleNotificationExpiry {
                id: 1,
                after: INFO_TTL,
            },
        ]);
        assert_eq!(
            cmd.into_vec(),
            vec![
                AppCmd::Quit,
                AppCmd::ScheduleNotificationExpiry {
                    id: 1,
                    after: INFO_TTL
                }
            ]
        );
    }
}
