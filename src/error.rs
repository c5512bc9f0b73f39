use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BuildHookError {
    #[error("config header not found: {path}")]
    ConfigNotFound {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("release define `{macro_name}` not found in {path}")]
    ReleaseNotFound { macro_name: String, path: PathBuf },
    #[error("build id missing from build context {path}")]
    BuildIdMissing { path: PathBuf },
    #[error("failed to copy artifact {source_path} -> {dest_path}")]
    CopyError {
        source_path: PathBuf,
        dest_path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("artifact already exists: {0} (drop --no-clobber to overwrite)")]
    ArtifactExists(PathBuf),
    #[error("invalid tool configuration: {0}")]
    InvalidConfig(String),
    #[error("build context {path} is corrupt: {reason}")]
    InvalidContext { path: PathBuf, reason: String },
}

impl BuildHookError {
    /// Stable code used in warnings and audit events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigNotFound { .. } => "CONFIG_NOT_FOUND",
            Self::ReleaseNotFound { .. } => "RELEASE_NOT_FOUND",
            Self::BuildIdMissing { .. } => "BUILD_ID_MISSING",
            Self::CopyError { .. } => "COPY_ERROR",
            Self::ArtifactExists(_) => "ARTIFACT_EXISTS",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::InvalidContext { .. } => "INVALID_CONTEXT",
        }
    }

    /// Whether packaging may continue with a sentinel value.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::ReleaseNotFound { .. } | Self::BuildIdMissing { .. }
        )
    }
}
