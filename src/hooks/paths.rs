use anyhow::{Context, Result};
use std::env;
use std::path::{Path, PathBuf};

use crate::hooks::config::HookConfig;

#[derive(Debug, Clone)]
pub struct ProjectPaths {
    pub project_dir: PathBuf,
    pub state_dir: PathBuf,
    pub context_file: PathBuf,
    pub audit_log: PathBuf,
}

impl ProjectPaths {
    pub fn config_header(&self, cfg: &HookConfig) -> PathBuf {
        self.project_dir.join(&cfg.config_header)
    }

    pub fn dist_dir(&self, cfg: &HookConfig) -> PathBuf {
        self.project_dir.join(&cfg.dist_dir)
    }
}

fn env_path(var: &str) -> Option<PathBuf> {
    match env::var(var) {
        Ok(v) if !v.trim().is_empty() => Some(PathBuf::from(v.trim())),
        _ => None,
    }
}

fn project_dir_from_inputs(
    explicit: Option<&Path>,
    env_dir: Option<PathBuf>,
    cwd: PathBuf,
) -> PathBuf {
    match explicit {
        Some(path) => path.to_path_buf(),
        None => env_dir.unwrap_or(cwd),
    }
}

fn paths_for(project_dir: PathBuf, state_override: Option<PathBuf>) -> ProjectPaths {
    let state_dir = state_override.unwrap_or_else(|| project_dir.join(".spojboard"));
    ProjectPaths {
        context_file: state_dir.join("build_context.json"),
        audit_log: state_dir.join("audit.log"),
        state_dir,
        project_dir,
    }
}

pub fn resolve_paths(explicit_project_dir: Option<&Path>) -> Result<ProjectPaths> {
    let cwd = env::current_dir().context("failed to resolve current working directory")?;
    let project_dir = project_dir_from_inputs(
        explicit_project_dir,
        env_path("SPOJBOARD_PROJECT_DIR"),
        cwd,
    );
    Ok(paths_for(project_dir, env_path("SPOJBOARD_STATE_DIR")))
}
