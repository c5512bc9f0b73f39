use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

use crate::error::BuildHookError;
use crate::hooks::build_id::{BuildId, Define};

pub const BUILD_ID_KEY: &str = "FIRMWARE_BUILD_ID";
const SCHEMA_VERSION: u32 = 1;

/// State handed from the build-id stage to the packaging stage.
///
/// The generator is the only writer. Packaging reads it, either directly
/// when both stages run in one process or from `build_context.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildContext {
    pub schema_version: u32,
    pub defines: Vec<Define>,
    pub values: BTreeMap<String, String>,
    pub timestamp: Option<String>,
    pub saved_at_epoch_secs: Option<u64>,
}

impl Default for BuildContext {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            defines: Vec::new(),
            values: BTreeMap::new(),
            timestamp: None,
            saved_at_epoch_secs: None,
        }
    }
}

impl BuildContext {
    pub fn set_define(&mut self, define: Define) {
        match self.defines.iter_mut().find(|d| d.name == define.name) {
            Some(existing) => *existing = define,
            None => self.defines.push(define),
        }
    }

    pub fn set_build_id(&mut self, id: BuildId) {
        self.values.insert(BUILD_ID_KEY.to_string(), id.hex());
    }

    pub fn set_timestamp(&mut self, timestamp: &str) {
        self.timestamp = Some(timestamp.to_string());
    }

    pub fn build_id(&self) -> Option<&str> {
        self.values
            .get(BUILD_ID_KEY)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }
}

/// Reads the persisted context. A missing file is `None`; a file that exists
/// but does not parse is an error.
pub fn load(path: &Path) -> Result<Option<BuildContext>> {
    if !path.exists() {
        return Ok(None);
    }
    let raw =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let ctx = serde_json::from_str::<BuildContext>(&raw).map_err(|err| {
        BuildHookError::InvalidContext {
            path: path.to_path_buf(),
            reason: err.to_string(),
        }
    })?;
    Ok(Some(ctx))
}

/// Deletes a persisted context. Returns whether one existed.
pub fn remove(path: &Path) -> Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(err) => Err(err).with_context(|| format!("failed to remove {}", path.display())),
    }
}

pub fn save(path: &Path, ctx: &mut BuildContext) -> Result<()> {
    let parent = path.parent().context("build context path has no parent")?;
    fs::create_dir_all(parent)
        .with_context(|| format!("failed to create {}", parent.display()))?;

    ctx.saved_at_epoch_secs = Some(crate::hooks::util::now_epoch_secs()?);

    let mut temp = NamedTempFile::new_in(parent)?;
    serde_json::to_writer_pretty(&mut temp, ctx)?;
    temp.write_all(b"\n")?;
    temp.flush()?;
    temp.persist(path).map_err(|e| {
        anyhow::anyhow!(
            "failed persisting build context {}: {}",
            path.display(),
            e.error
        )
    })?;
    Ok(())
}
