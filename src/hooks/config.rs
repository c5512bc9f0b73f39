use anyhow::Result;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::BuildHookError;
use crate::hooks::paths::ProjectPaths;
use crate::hooks::util::is_file_name_safe;

pub const DEFAULT_PRODUCT_PREFIX: &str = "spojboard";
pub const DEFAULT_CONFIG_HEADER: &str = "src/config/AppConfig.h";
pub const DEFAULT_RELEASE_MACRO: &str = "FIRMWARE_RELEASE";
pub const DEFAULT_DIST_DIR: &str = "dist";
pub const DEFAULT_FALLBACK: &str = "unknown";
pub const CONFIG_FILE_NAME: &str = "spojboard.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookConfig {
    pub product_prefix: String,
    pub config_header: PathBuf,
    pub release_macro: String,
    pub dist_dir: PathBuf,
    pub fallback: String,
}

impl Default for HookConfig {
    fn default() -> Self {
        Self {
            product_prefix: DEFAULT_PRODUCT_PREFIX.to_string(),
            config_header: PathBuf::from(DEFAULT_CONFIG_HEADER),
            release_macro: DEFAULT_RELEASE_MACRO.to_string(),
            dist_dir: PathBuf::from(DEFAULT_DIST_DIR),
            fallback: DEFAULT_FALLBACK.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct PartialHookConfig {
    package: Option<PartialPackageConfig>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct PartialPackageConfig {
    product_prefix: Option<String>,
    config_header: Option<PathBuf>,
    release_macro: Option<String>,
    dist_dir: Option<PathBuf>,
    fallback: Option<String>,
}

fn is_c_identifier(value: &str) -> bool {
    let mut chars = value.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn invalid(msg: impl Into<String>) -> anyhow::Error {
    BuildHookError::InvalidConfig(msg.into()).into()
}

fn validate(cfg: &HookConfig) -> Result<()> {
    if !is_file_name_safe(&cfg.product_prefix) {
        return Err(invalid(
            "product_prefix must be non-empty and contain no path separators",
        ));
    }
    if !is_file_name_safe(&cfg.fallback) {
        return Err(invalid(
            "fallback must be non-empty and contain no path separators",
        ));
    }
    if !is_c_identifier(&cfg.release_macro) {
        return Err(invalid(format!(
            "release_macro `{}` is not a valid C identifier",
            cfg.release_macro
        )));
    }
    if cfg.config_header.as_os_str().is_empty() {
        return Err(invalid("config_header cannot be empty"));
    }
    if cfg.dist_dir.as_os_str().is_empty() {
        return Err(invalid("dist_dir cannot be empty"));
    }
    Ok(())
}

fn resolve_config_path(paths: &ProjectPaths) -> PathBuf {
    if let Ok(custom) = env::var("SPOJBOARD_CONFIG_PATH") {
        let trimmed = custom.trim();
        if !trimmed.is_empty() {
            return PathBuf::from(trimmed);
        }
    }
    paths.project_dir.join(CONFIG_FILE_NAME)
}

fn merge_toml(base: &mut HookConfig, raw: &str, origin: &Path) -> Result<()> {
    let parsed: PartialHookConfig = toml::from_str(raw).map_err(|err| {
        invalid(format!("failed to parse {}: {err}", origin.display()))
    })?;
    let Some(package) = parsed.package else {
        return Ok(());
    };
    if let Some(v) = package.product_prefix {
        base.product_prefix = v;
    }
    if let Some(v) = package.config_header {
        base.config_header = v;
    }
    if let Some(v) = package.release_macro {
        base.release_macro = v;
    }
    if let Some(v) = package.dist_dir {
        base.dist_dir = v;
    }
    if let Some(v) = package.fallback {
        base.fallback = v;
    }
    Ok(())
}

fn merge_file_config(base: &mut HookConfig, paths: &ProjectPaths) -> Result<()> {
    let path = resolve_config_path(paths);
    if !path.exists() {
        return Ok(());
    }
    let raw = fs::read_to_string(&path)
        .map_err(|err| invalid(format!("failed to read {}: {err}", path.display())))?;
    merge_toml(base, &raw, &path)
}

fn apply_env_overrides(cfg: &mut HookConfig, lookup: impl Fn(&str) -> Option<String>) {
    let get = |var: &str| {
        lookup(var)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };
    if let Some(v) = get("SPOJBOARD_PRODUCT_PREFIX") {
        cfg.product_prefix = v;
    }
    if let Some(v) = get("SPOJBOARD_CONFIG_HEADER") {
        cfg.config_header = PathBuf::from(v);
    }
    if let Some(v) = get("SPOJBOARD_RELEASE_MACRO") {
        cfg.release_macro = v;
    }
    if let Some(v) = get("SPOJBOARD_DIST_DIR") {
        cfg.dist_dir = PathBuf::from(v);
    }
    if let Some(v) = get("SPOJBOARD_FALLBACK") {
        cfg.fallback = v;
    }
}

pub fn load_config(paths: &ProjectPaths) -> Result<HookConfig> {
    let mut cfg = HookConfig::default();
    merge_file_config(&mut cfg, paths)?;
    apply_env_overrides(&mut cfg, |var| env::var(var).ok());
    validate(&cfg)?;
    Ok(cfg)
}
