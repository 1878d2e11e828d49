//! Frame composition and painting.
//!
//! `compose_frame()` turns the model into a list of styled lines with no
//! terminal access, so tests can assert on text. `paint()` writes those lines
//! with crossterm.

#![allow(missing_docs)]

use std::io::{self, Write};

use crossterm::cursor::MoveTo;
use crossterm::queue;
use crossterm::style::{Attribute, Color, SetAttribute, SetForegroundColor};
use crossterm::terminal::{Clear, ClearType};

use super::input::help_bindings;
use super::model::{AppModel, NotificationLevel, Overlay};
use crate::api::model::{Resource, Task};
use crate::navigator::controller::TaskDetail;

const SPINNER: [char; 4] = ['|', '/', '-', '\\'];
const APP_TITLE: &str = "ClickUp";
const DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Rows taken by the header, the level label, and the footer.
const CHROME_ROWS: usize = 4;

// ──────────────────── styled lines ────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Header,
    Label,
    Normal,
    Selected,
    Muted,
    Info,
    Error,
    Footer,
}

impl Tone {
    const fn color(self) -> Color {
        match self {
            Self::Header | Self::Footer | Self::Info => Color::Cyan,
            Self::Label | Self::Normal => Color::White,
            Self::Selected => Color::Yellow,
            Self::Muted => Color::DarkGrey,
            Self::Error => Color::Red,
        }
    }

    const fn bold(self) -> bool {
        matches!(self, Self::Header | Self::Label | Self::Selected)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyledLine {
    pub text: String,
    pub tone: Tone,
}

impl StyledLine {
    fn new(text: impl Into<String>, tone: Tone) -> Self {
        Self {
            text: text.into(),
            tone,
        }
    }
}

// ──────────────────── composition ────────────────────

/// Build every visible line for the current terminal size.
#[must_use]
pub fn compose_frame(model: &AppModel) -> Vec<StyledLine> {
    let (cols, rows) = model.terminal_size;
    let width = usize::from(cols).max(1);
    let rows = usize::from(rows);

    let notices: Vec<StyledLine> = model
        .notifications
        .iter()
        .map(|n| {
            let tone = match n.level {
                NotificationLevel::Info => Tone::Info,
                NotificationLevel::Error => Tone::Error,
            };
            StyledLine::new(format!(" {}", n.message), tone)
        })
        .collect();
    let body_rows = rows.saturating_sub(CHROME_ROWS + notices.len()).max(1);

    let mut lines = Vec::with_capacity(rows);
    lines.push(StyledLine::new(header_text(model, width), Tone::Header));
    lines.push(StyledLine::new(String::new(), Tone::Normal));

    if model.overlay == Some(Overlay::Help) {
        lines.push(StyledLine::new(" Keys", Tone::Label));
        lines.extend(help_lines().into_iter().take(body_rows));
    } else if let Some(detail) = model.nav.detail() {
        lines.push(StyledLine::new(" Task", Tone::Label));
        lines.extend(detail_lines(detail, model.tick).into_iter().take(body_rows));
    } else {
        let active = model.nav.active();
        lines.push(StyledLine::new(format!(" {}", active.level.label()), Tone::Label));
        lines.extend(list_lines(model, body_rows));
    }

    lines.extend(notices);
    lines.push(StyledLine::new(footer_text(model), Tone::Footer));

    for line in &mut lines {
        line.text = fit(&line.text, width);
    }
    lines.truncate(rows.max(1));
    lines
}

fn header_text(model: &AppModel, width: usize) -> String {
    let crumbs = model.nav.path().breadcrumb();
    let mut title = format!(" {APP_TITLE}");
    if !crumbs.is_empty() {
        title.push_str("  ");
        title.push_str(&crumbs.join(" > "));
    }
    if model.nav.is_loading() {
        let spin = spinner(model.tick);
        let used = title.chars().count() + 2;
        let pad = width.saturating_sub(used);
        title.push_str(&format!("{:pad$}{spin} ", "", pad = pad));
    }
    title
}

fn spinner(tick: u64) -> char {
    // Index is always < 4.
    SPINNER[usize::try_from(tick % 4).unwrap_or(0)]
}

fn list_lines(model: &AppModel, body_rows: usize) -> Vec<StyledLine> {
    let active = model.nav.active();
    let Some(items) = active.children.as_deref() else {
        let text = if model.nav.is_loading() {
            format!("   {} Loading...", spinner(model.tick))
        } else {
            "   Failed to load, press r to retry".to_string()
        };
        return vec![StyledLine::new(text, Tone::Muted)];
    };
    if items.is_empty() {
        return vec![StyledLine::new("   (empty)", Tone::Muted)];
    }

    let start = (active.cursor + 1).saturating_sub(body_rows);
    let name_width = items
        .iter()
        .map(|item| item.name().chars().count())
        .max()
        .unwrap_or(0)
        .min(48);

    items
        .iter()
        .enumerate()
        .skip(start)
        .take(body_rows)
        .map(|(index, item)| {
            let selected = index == active.cursor;
            StyledLine::new(
                item_text(item, selected, name_width),
                if selected { Tone::Selected } else { Tone::Normal },
            )
        })
        .collect()
}

fn item_text(item: &Resource, selected: bool, name_width: usize) -> String {
    let marker = if selected { '>' } else { ' ' };
    let name = fit(item.name(), name_width.max(1));
    match item.summary() {
        Some(summary) => format!(" {marker} {name:<name_width$}  {summary}"),
        None => format!(" {marker} {name}"),
    }
}

fn detail_lines(detail: &TaskDetail, tick: u64) -> Vec<StyledLine> {
    let Some(task) = &detail.task else {
        return vec![StyledLine::new(
            format!("   {} Loading task {}...", spinner(tick), detail.task_id),
            Tone::Muted,
        )];
    };
    task_fields(task)
        .into_iter()
        .map(|(label, value)| StyledLine::new(format!("   {label:<9} {value}"), Tone::Normal))
        .collect()
}

fn task_fields(task: &Task) -> Vec<(&'static str, String)> {
    let mut fields = vec![("Name", task.name.clone()), ("ID", task.id.clone())];
    if !task.status.status.is_empty() {
        fields.push(("Status", task.status.status.clone()));
    }
    if let Some(username) = task.creator.as_ref().and_then(|c| c.username.clone()) {
        fields.push(("Creator", username));
    }
    if let Some(created) = task.created_at() {
        fields.push(("Created", created.format(DATE_FORMAT).to_string()));
    }
    if let Some(updated) = task.updated_at() {
        fields.push(("Updated", updated.format(DATE_FORMAT).to_string()));
    }
    if let Some(url) = &task.url {
        fields.push(("URL", url.clone()));
    }
    if let Some(description) = task.description.as_deref().filter(|d| !d.trim().is_empty()) {
        fields.push(("Notes", description.lines().next().unwrap_or_default().to_string()));
    }
    fields
}

fn help_lines() -> Vec<StyledLine> {
    help_bindings()
        .iter()
        .map(|b| StyledLine::new(format!("   {:<20} {}", b.keys, b.description), Tone::Normal))
        .collect()
}

fn footer_text(model: &AppModel) -> String {
    if model.overlay.is_some() {
        return " Esc close help".to_string();
    }
    let mut hints = vec!["j/k move", "Enter open", "Esc back"];
    if model.nav.can_retry() && !model.nav.is_loading() {
        hints.push("r retry");
    }
    hints.extend(["R refresh", "? help", "q quit"]);
    format!(" {}", hints.join("  "))
}

/// Truncate to `width` characters, marking the cut with an ellipsis.
fn fit(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut out: String = text.chars().take(width.saturating_sub(1)).collect();
    out.push('…');
    out
}

// ──────────────────── painting ────────────────────

/// Paint composed lines to the terminal and flush.
pub fn paint<W: Write>(out: &mut W, lines: &[StyledLine]) -> io::Result<()> {
    queue!(out, MoveTo(0, 0), Clear(ClearType::All))?;
    for (row, line) in lines.iter().enumerate() {
        let row = u16::try_from(row).unwrap_or(u16::MAX);
        queue!(out, MoveTo(0, row), SetForegroundColor(line.tone.color()))?;
        if line.tone.bold() {
            queue!(out, SetAttribute(Attribute::Bold))?;
        }
        write!(out, "{}", line.text)?;
        queue!(out, SetAttribute(Attribute::Reset))?;
    }
    out.flush()
}

/// Plain-text rendering used by tests and debug logging.
#[must_use]
pub fn render_to_string(model: &AppModel) -> String {
    compose_frame(model)
        .into_iter()
        .map(|line| line.text)
        .collect::<Vec<_>>()
        .join("\n")
}

// ──────────────────── tests ────────────────────
