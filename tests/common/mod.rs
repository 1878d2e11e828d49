#![allow(dead_code)]

use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;
use std::process::{Command, ExitStatus};
use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;

use clickup_tui::api::ResourceClient;
use clickup_tui::api::model::{Folder, List, Resource, Space, Task, TaskStatus, Workspace};
use clickup_tui::core::errors::{CtuError, Result};
use clickup_tui::navigator::HierarchyLevel;

// ──────────────────── scripted client ────────────────────

/// In-memory hierarchy with call counting and injectable failures.
///
/// Workspaces are `w1` and `w2`. Every other parent `p` has children
/// `p-a` and `p-b`, except parents listed as empty.
#[derive(Default)]
pub struct ScriptedClient {
    calls: Mutex<Vec<(HierarchyLevel, Option<String>)>>,
    task_calls: Mutex<Vec<String>>,
    delay: Mutex<Duration>,
    failing: Mutex<Option<HierarchyLevel>>,
    empty: Mutex<HashSet<String>>,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(self, delay: Duration) -> Self {
        *self.delay.lock() = delay;
        self
    }

    pub fn with_empty(self, parent: &str) -> Self {
        self.empty.lock().insert(parent.to_string());
        self
    }

    /// Fail every fetch at `level` with a timeout until cleared.
    pub fn fail_level(&self, level: Option<HierarchyLevel>) {
        *self.failing.lock() = level;
    }

    pub fn calls_at(&self, level: HierarchyLevel) -> usize {
        self.calls.lock().iter().filter(|(l, _)| *l == level).count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().len() + self.task_calls.lock().len()
    }

    pub fn task_calls(&self) -> usize {
        self.task_calls.lock().len()
    }

    fn pause(&self) {
        let delay = *self.delay.lock();
        if !delay.is_zero() {
            thread::sleep(delay);
        }
    }
}

pub fn task(id: &str) -> Task {
    Task {
        id: id.to_string(),
        name: format!("Task {id}"),
        status: TaskStatus {
            status: "open".into(),
            color: None,
            kind: None,
        },
        description: None,
        creator: None,
        url: Some(format!("https://app.clickup.com/t/{id}")),
        date_created: Some("1700000000000".into()),
        date_updated: None,
    }
}

fn child(level: HierarchyLevel, id: String) -> Resource {
    let name = format!("{} {id}", level.label());
    match level {
        HierarchyLevel::Workspace => Resource::Workspace(Workspace {
            id,
            name,
            color: None,
        }),
        HierarchyLevel::Space => Resource::Space(Space {
            id,
            name,
            private: false,
        }),
        HierarchyLevel::Folder => Resource::Folder(Folder {
            id,
            name,
            hidden: false,
            task_count: Some(2),
        }),
        HierarchyLevel::List => Resource::List(List {
            id,
            name,
            content: None,
            task_count: Some(2),
            archived: false,
        }),
        HierarchyLevel::TaskCollection => Resource::Task(task(&id)),
    }
}

impl ResourceClient for ScriptedClient {
    fn fetch_children(&self, level: HierarchyLevel, parent_id: Option<&str>) -> Result<Vec<Resource>> {
        self.calls
            .lock()
            .push((level, parent_id.map(str::to_string)));
        self.pause();

        if *self.failing.lock() == Some(level) {
            return Err(CtuError::Timeout {
                endpoint: format!("/{}/{}", level.namespace(), parent_id.unwrap_or("")),
            });
        }
        let ids: Vec<String> = match parent_id {
            None => vec!["w1".into(), "w2".into()],
            Some(parent) if self.empty.lock().contains(parent) => Vec::new(),
            Some(parent) => vec![format!("{parent}-a"), format!("{parent}-b")],
        };
        Ok(ids.into_iter().map(|id| child(level, id)).collect())
    }

    fn fetch_task(&self, task_id: &str) -> Result<Task> {
        self.task_calls.lock().push(task_id.to_string());
        self.pause();
        Ok(task(task_id))
    }
}

// ──────────────────── binary runner ────────────────────

pub struct CmdResult {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
    pub log_path: PathBuf,
}

fn now_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_millis())
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

fn resolve_bin_path() -> PathBuf {
    if let Ok(path) = std::env::var("CARGO_BIN_EXE_clickup-tui") {
        return PathBuf::from(path);
    }

    let exe_name = if cfg!(windows) {
        "clickup-tui.exe"
    } else {
        "clickup-tui"
    };
    let fallback = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(PathBuf::from))
        .and_then(|deps| deps.parent().map(PathBuf::from))
        .map(|debug_dir| debug_dir.join(exe_name));

    match fallback {
        Some(path) if path.exists() => path,
        _ => panic!("unable to resolve clickup-tui binary path for integration test"),
    }
}

/// Run the binary with a clean `CLICKUP_TUI_*` environment and keep a
/// transcript for post-mortem.
pub fn run_cli_case(case_name: &str, args: &[&str]) -> CmdResult {
    let root = std::env::temp_dir().join("clickup-tui-test-logs");
    fs::create_dir_all(&root).expect("create temp test log dir");

    let log_path = root.join(format!("{}-{}.log", sanitize(case_name), now_millis()));
    let bin_path = resolve_bin_path();

    let mut command = Command::new(&bin_path);
    command.args(args).env("RUST_BACKTRACE", "1");
    for name in [
        "CLICKUP_TUI_TOKEN",
        "CLICKUP_TUI_API_URL",
        "CLICKUP_TUI_REQUEST_TIMEOUT_MS",
        "CLICKUP_TUI_CACHE_DIR",
        "CLICKUP_TUI_LOG_FILE",
        "CLICKUP_TUI_DEFAULT_WORKSPACE",
        "RUST_LOG",
    ] {
        command.env_remove(name);
    }
    let output = command.output().expect("execute clickup-tui command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();

    let mut log_content = String::new();
    log_content.push_str(&format!("case={case_name}\n"));
    log_content.push_str(&format!("bin={}\n", bin_path.display()));
    log_content.push_str(&format!("args={args:?}\n"));
    log_content.push_str(&format!("status={}\n", output.status));
    log_content.push_str("----- stdout -----\n");
    log_content.push_str(&stdout);
    log_content.push('\n');
    log_content.push_str("----- stderr -----\n");
    log_content.push_str(&stderr);
    log_content.push('\n');
    fs::write(&log_path, log_content).expect("write test log");

    CmdResult {
        status: output.status,
        stdout,
        stderr,
        log_path,
    }
}
