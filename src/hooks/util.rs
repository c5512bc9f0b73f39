use anyhow::{Context, Result};
use std::time::{SystemTime, UNIX_EPOCH};

/// Current Unix epoch in seconds.
pub fn now_epoch_secs() -> Result<u64> {
    Ok(SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .context("system clock is before UNIX_EPOCH")?
        .as_secs())
}

/// A value usable as one component of a file name: non-empty, no path
/// separators, no parent-dir escapes.
pub fn is_file_name_safe(value: &str) -> bool {
    !value.is_empty()
        && value != "."
        && value != ".."
        && !value.contains(['/', '\\'])
        && !value.chars().any(char::is_control)
}
