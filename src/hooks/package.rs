use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use crate::error::BuildHookError;
use crate::hooks::build_id::BuildId;
use crate::hooks::config::HookConfig;
use crate::hooks::context::BuildContext;
use crate::hooks::paths::ProjectPaths;
use crate::hooks::release::read_release;
use crate::hooks::warn::{self, WarnEvent};

#[derive(Debug, Clone)]
pub struct PackageOutcome {
    pub source_path: PathBuf,
    pub dest_path: PathBuf,
    pub file_name: String,
    pub release: String,
    pub build_id: String,
    pub release_fallback: bool,
    pub build_id_fallback: bool,
    pub overwrote: bool,
    pub bytes: u64,
    pub sha256: String,
}

pub fn artifact_file_name(prefix: &str, release: &str, build_id: &str) -> String {
    format!("{prefix}-r{release}-{build_id}.bin")
}

/// Path separators in a release string would move the artifact out of the
/// dist directory.
fn file_name_component(value: &str) -> String {
    value
        .chars()
        .map(|c| if c == '/' || c == '\\' || c.is_control() { '_' } else { c })
        .collect()
}

/// Release as it will appear in the artifact name, and whether it is the
/// fallback.
pub fn resolve_release(paths: &ProjectPaths, cfg: &HookConfig) -> Result<(String, bool)> {
    let header = paths.config_header(cfg);
    match read_release(&header, &cfg.release_macro) {
        Ok(release) => Ok((file_name_component(&release), false)),
        Err(err) => {
            let Some(hook_err) = err.downcast_ref::<BuildHookError>() else {
                return Err(err);
            };
            if !hook_err.is_recoverable() {
                return Err(err);
            }
            warn::emit(WarnEvent {
                code: hook_err.code(),
                stage: "package",
                fallback: &cfg.fallback,
                reason: &hook_err.to_string(),
            });
            Ok((cfg.fallback.clone(), true))
        }
    }
}

pub fn resolve_build_id(
    paths: &ProjectPaths,
    cfg: &HookConfig,
    ctx: Option<&BuildContext>,
) -> Result<(String, bool)> {
    if let Some(raw) = ctx.and_then(BuildContext::build_id) {
        let id = raw
            .parse::<BuildId>()
            .map_err(|reason| BuildHookError::InvalidContext {
                path: paths.context_file.clone(),
                reason,
            })?;
        return Ok((id.hex(), false));
    }
    let missing = BuildHookError::BuildIdMissing {
        path: paths.context_file.clone(),
    };
    warn::emit(WarnEvent {
        code: missing.code(),
        stage: "package",
        fallback: &cfg.fallback,
        reason: &missing.to_string(),
    });
    Ok((cfg.fallback.clone(), true))
}

/// Copies through a temp file in the destination directory so a failed copy
/// never leaves a partial artifact under the final name. Permissions and
/// modification time follow the source.
fn copy_preserving_metadata(source: &Path, dest: &Path) -> io::Result<()> {
    let dest_dir = dest
        .parent()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "destination has no parent"))?;
    let meta = fs::metadata(source)?;
    if !meta.is_file() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "artifact is not a regular file",
        ));
    }

    let temp = NamedTempFile::new_in(dest_dir)?;
    fs::copy(source, temp.path())?;
    if let Ok(modified) = meta.modified() {
        fs::File::options()
            .write(true)
            .open(temp.path())?
            .set_modified(modified)?;
    }
    temp.persist(dest).map_err(|e| e.error)?;
    Ok(())
}

fn file_digest(path: &Path) -> Result<(u64, String)> {
    let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok((bytes.len() as u64, format!("{:x}", hasher.finalize())))
}

/// Names and copies `artifact` into the dist directory.
pub fn package(
    paths: &ProjectPaths,
    cfg: &HookConfig,
    ctx: Option<&BuildContext>,
    artifact: &Path,
    no_clobber: bool,
) -> Result<PackageOutcome> {
    let (release, release_fallback) = resolve_release(paths, cfg)?;
    let (build_id, build_id_fallback) = resolve_build_id(paths, cfg, ctx)?;

    let dist_dir = paths.dist_dir(cfg);
    let file_name = artifact_file_name(&cfg.product_prefix, &release, &build_id);
    let dest_path = dist_dir.join(&file_name);
    let copy_error = |source: io::Error| BuildHookError::CopyError {
        source_path: artifact.to_path_buf(),
        dest_path: dest_path.clone(),
        source,
    };

    // Nothing is created under dist until the source is known to exist.
    if !artifact.is_file() {
        return Err(copy_error(io::Error::new(
            io::ErrorKind::NotFound,
            "artifact not found",
        ))
        .into());
    }
    fs::create_dir_all(&dist_dir).map_err(copy_error)?;

    let overwrote = dest_path.exists();
    if overwrote && no_clobber {
        return Err(BuildHookError::ArtifactExists(dest_path.clone()).into());
    }
    copy_preserving_metadata(artifact, &dest_path).map_err(copy_error)?;

    let (bytes, sha256) = file_digest(&dest_path)?;
    Ok(PackageOutcome {
        source_path: artifact.to_path_buf(),
        dest_path,
        file_name,
        release,
        build_id,
        release_fallback,
        build_id_fallback,
        overwrote,
        bytes,
        sha256,
    })
}
