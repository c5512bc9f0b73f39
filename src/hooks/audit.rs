use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::Path;

use crate::hooks::util::now_epoch_secs;
use crate::hooks::warn::{self, WarnEvent};

const MAX_AUDIT_LOG_SIZE: u64 = 1024 * 1024; // 1MiB

#[derive(Debug, Clone, Serialize)]
pub struct AuditEvent {
    pub at_epoch_secs: u64,
    pub stage: String,
    pub status: String,
    pub message: String,
}

pub fn append_event(log_path: &Path, stage: &str, status: &str, message: &str) -> Result<()> {
    if let Some(parent) = log_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let event = AuditEvent {
        at_epoch_secs: now_epoch_secs()?,
        stage: stage.to_string(),
        status: status.to_string(),
        message: message.to_string(),
    };

    let line = format!("{}\n", serde_json::to_string(&event)?);
    // An unrotated log keeps growing but stays usable.
    if let Err(err) = maybe_rotate_log(log_path) {
        warn::emit(WarnEvent {
            code: "AUDIT_ROTATE_FAILED",
            stage,
            fallback: "append",
            reason: &format!("{err:#}"),
        });
    }

    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .with_context(|| format!("failed to open {}", log_path.display()))?;
    file.write_all(line.as_bytes())?;
    Ok(())
}

fn maybe_rotate_log(path: &Path) -> Result<()> {
    if let Ok(meta) = fs::metadata(path)
        && meta.len() >= MAX_AUDIT_LOG_SIZE
    {
        let backup = format!("{}.1", path.display());
        fs::rename(path, &backup)
            .with_context(|| format!("failed to rotate {} -> {backup}", path.display()))?;
    }
    Ok(())
}
