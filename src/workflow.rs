//! Output and environment sink for the CI runner.
//!
//! [`GithubActions`] speaks the runner's workflow-command protocol: annotations
//! and groups go to stdout, while exported variables, PATH entries and step
//! state are appended to the files named by `GITHUB_ENV`, `GITHUB_PATH` and
//! `GITHUB_STATE`. [`MemoryWorkflow`] records the same calls in memory.

use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;

pub const GITHUB_ENV: &str = "GITHUB_ENV";
pub const GITHUB_PATH: &str = "GITHUB_PATH";
pub const GITHUB_STATE: &str = "GITHUB_STATE";

/// Structured log and key/value environment sink visible to later steps.
pub trait Workflow {
    fn info(&self, message: &str);
    fn error(&self, message: &str);
    /// Opens a collapsible group; everything up to [`Workflow::end_group`] is nested in it.
    fn start_group(&self, name: &str);
    fn end_group(&self);
    fn export_variable(&self, name: &str, value: &str) -> io::Result<()>;
    /// Prepends `path` to the PATH of later steps.
    fn add_path(&self, path: &Path) -> io::Result<()>;
    fn save_state(&self, name: &str, value: &str) -> io::Result<()>;
    fn state(&self, name: &str) -> Option<String>;
}

/// [`Workflow`] for GitHub-compatible runners.
#[derive(Debug, Clone, Default)]
pub struct GithubActions {
    env_file: Option<PathBuf>,
    path_file: Option<PathBuf>,
    state_file: Option<PathBuf>,
}

impl GithubActions {
    pub fn from_env() -> Self {
        let file = |name: &str| {
            std::env::var_os(name)
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
        };
        GithubActions {
            env_file: file(GITHUB_ENV),
            path_file: file(GITHUB_PATH),
            state_file: file(GITHUB_STATE),
        }
    }

    pub fn with_files(env_file: PathBuf, path_file: PathBuf, state_file: PathBuf) -> Self {
        GithubActions {
            env_file: Some(env_file),
            path_file: Some(path_file),
            state_file: Some(state_file),
        }
    }
}

impl Workflow for GithubActions {
    fn info(&self, message: &str) {
        println!("{message}");
    }

    fn error(&self, message: &str) {
        println!("::error::{}", escape_data(message));
    }

    fn start_group(&self, name: &str) {
        println!("::group::{}", escape_data(name));
    }

    fn end_group(&self) {
        println!("::endgroup::");
    }

    fn export_variable(&self, name: &str, value: &str) -> io::Result<()> {
        match &self.env_file {
            Some(file) => append(file, &key_value_message(name, value)?),
            None => {
                debug!("{} is not set; not exporting {}={}", GITHUB_ENV, name, value);
                Ok(())
            }
        }
    }

    fn add_path(&self, path: &Path) -> io::Result<()> {
        match &self.path_file {
            Some(file) => append(file, &format!("{}\n", path.display())),
            None => {
                debug!("{} is not set; not adding {}", GITHUB_PATH, path.display());
                Ok(())
            }
        }
    }

    fn save_state(&self, name: &str, value: &str) -> io::Result<()> {
        match &self.state_file {
            Some(file) => append(file, &key_value_message(name, value)?),
            None => {
                debug!("{} is not set; not saving {}={}", GITHUB_STATE, name, value);
                Ok(())
            }
        }
    }

    fn state(&self, name: &str) -> Option<String> {
        std::env::var(format!("STATE_{name}"))
            .ok()
            .filter(|v| !v.is_empty())
    }
}

fn append(file: &Path, content: &str) -> io::Result<()> {
    let mut handle = OpenOptions::new().create(true).append(true).open(file)?;
    handle.write_all(content.as_bytes())
}

/// Formats `name<<DELIM\nvalue\nDELIM\n` for the runner's file commands.
fn key_value_message(name: &str, value: &str) -> io::Result<String> {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    let delimiter = format!("ghadelimiter_{}_{}", std::process::id(), nanos);
    delimited(name, value, &delimiter)
}

fn delimited(name: &str, value: &str, delimiter: &str) -> io::Result<String> {
    for (field, text) in [("name", name), ("value", value)] {
        if text.contains(delimiter) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("Unexpected input: {field} of '{name}' contains the delimiter '{delimiter}'"),
            ));
        }
    }
    Ok(format!("{name}<<{delimiter}\n{value}\n{delimiter}\n"))
}

fn escape_data(message: &str) -> String {
    message
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

/// One recorded [`Workflow`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowEvent {
    Info(String),
    Error(String),
    StartGroup(String),
    EndGroup,
    Export(String, String),
    AddPath(PathBuf),
    SaveState(String, String),
}

/// In-memory [`Workflow`] that records every call.
#[derive(Debug, Default)]
pub struct MemoryWorkflow {
    events: Mutex<Vec<WorkflowEvent>>,
    states: Mutex<HashMap<String, String>>,
}

impl MemoryWorkflow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds step state as if saved by an earlier phase.
    pub fn with_state(self, name: &str, value: &str) -> Self {
        lock(&self.states).insert(name.to_string(), value.to_string());
        self
    }

    pub fn events(&self) -> Vec<WorkflowEvent> {
        lock(&self.events).clone()
    }

    /// Last exported value of `name`.
    pub fn exported(&self, name: &str) -> Option<String> {
        lock(&self.events).iter().rev().find_map(|event| match event {
            WorkflowEvent::Export(k, v) if k == name => Some(v.clone()),
            _ => None,
        })
    }

    /// Group names paired with the info lines emitted inside them.
    pub fn groups(&self) -> Vec<(String, String)> {
        let mut groups = Vec::new();
        let mut open: Option<(String, Vec<String>)> = None;
        for event in lock(&self.events).iter() {
            match event {
                WorkflowEvent::StartGroup(name) => open = Some((name.clone(), vec![])),
                WorkflowEvent::Info(line) => {
                    if let Some((_, lines)) = open.as_mut() {
                        lines.push(line.clone());
                    }
                }
                WorkflowEvent::EndGroup => {
                    if let Some((name, lines)) = open.take() {
                        groups.push((name, lines.join("\n")));
                    }
                }
                _ => {}
            }
        }
        groups
    }

    pub fn errors(&self) -> Vec<String> {
        lock(&self.events)
            .iter()
            .filter_map(|event| match event {
                WorkflowEvent::Error(message) => Some(message.clone()),
                _ => None,
            })
            .collect()
    }

    fn record(&self, event: WorkflowEvent) {
        lock(&self.events).push(event);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl Workflow for MemoryWorkflow {
    fn info(&self, message: &str) {
        self.record(WorkflowEvent::Info(message.to_string()));
    }

    fn error(&self, message: &str) {
        self.record(WorkflowEvent::Error(message.to_string()));
    }

    fn start_group(&self, name: &str) {
        self.record(WorkflowEvent::StartGroup(name.to_string()));
    }

    fn end_group(&self) {
        self.record(WorkflowEvent::EndGroup);
    }

    fn export_variable(&self, name: &str, value: &str) -> io::Result<()> {
        self.record(WorkflowEvent::Export(name.to_string(), value.to_string()));
        Ok(())
    }

    fn add_path(&self, path: &Path) -> io::Result<()> {
        self.record(WorkflowEvent::AddPath(path.to_path_buf()));
        Ok(())
    }

    fn save_state(&self, name: &str, value: &str) -> io::Result<()> {
        lock(&self.states).insert(name.to_string(), value.to_string());
        self.record(WorkflowEvent::SaveState(name.to_string(), value.to_string()));
        Ok(())
    }

    fn state(&self, name: &str) -> Option<String> {
        lock(&self.states).get(name).cloned()
    }
}
