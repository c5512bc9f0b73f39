pub mod build_id;
pub mod package;
pub mod pipeline;
pub mod show_context;

use anyhow::Result;
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::hooks::audit;
use crate::hooks::config::{HookConfig, load_config};
use crate::hooks::paths::{ProjectPaths, resolve_paths};
use crate::hooks::warn::{self, WarnEvent};

#[derive(Debug, Clone, Serialize)]
pub struct CommandReport {
    pub command: String,
    pub ok: bool,
    pub details: Vec<String>,
    pub issues: Vec<String>,
}

impl CommandReport {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            ok: true,
            details: Vec::new(),
            issues: Vec::new(),
        }
    }

    pub fn detail(&mut self, text: impl Into<String>) {
        self.details.push(text.into());
    }

    pub fn issue(&mut self, text: impl Into<String>) {
        self.ok = false;
        self.issues.push(text.into());
    }
}

/// Resolved paths and tool configuration shared by every command.
pub fn setup(project_dir: Option<&Path>) -> Result<(ProjectPaths, HookConfig)> {
    let paths = resolve_paths(project_dir)?;
    let cfg = load_config(&paths)?;
    Ok((paths, cfg))
}

/// Appends an audit event. A failing audit log never fails the build.
pub fn record(paths: &ProjectPaths, stage: &str, status: &str, message: &str) {
    if let Err(err) = audit::append_event(&paths.audit_log, stage, status, message) {
        warn::emit(WarnEvent {
            code: "AUDIT_WRITE_FAILED",
            stage,
            fallback: "skip",
            reason: &format!("{err:#}"),
        });
    }
}

/// Relative command-line paths are taken from the project root.
pub fn resolve_in_project(paths: &ProjectPaths, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        paths.project_dir.join(path)
    }
}

/// `path` relative to the project root when it lives inside it.
pub fn display_relative(paths: &ProjectPaths, path: &Path) -> String {
    path.strip_prefix(&paths.project_dir)
        .map(Path::to_path_buf)
        .unwrap_or_else(|_| PathBuf::from(path))
        .display()
        .to_string()
}
