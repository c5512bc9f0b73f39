use anyhow::Result;
use std::path::PathBuf;

use crate::commands::{CommandReport, display_relative, record, resolve_in_project, setup};
use crate::error::BuildHookError;
use crate::hooks::config::HookConfig;
use crate::hooks::context::{self, BuildContext};
use crate::hooks::package::{PackageOutcome, package};
use crate::hooks::paths::ProjectPaths;

#[derive(Debug, Clone, Default)]
pub struct PackageOptions {
    pub project_dir: Option<PathBuf>,
    pub artifact: PathBuf,
    pub no_clobber: bool,
}

pub(crate) fn describe_outcome(
    report: &mut CommandReport,
    paths: &ProjectPaths,
    outcome: &PackageOutcome,
) {
    report.detail(format!(
        "firmware copied to: {}",
        display_relative(paths, &outcome.dest_path)
    ));
    report.detail(format!("source={}", display_relative(paths, &outcome.source_path)));
    report.detail(format!("release={}", outcome.release));
    if outcome.release_fallback {
        report.detail("release_source=fallback");
    }
    report.detail(format!("build_id={}", outcome.build_id));
    if outcome.build_id_fallback {
        report.detail("build_id_source=fallback");
    }
    report.detail(format!("bytes={}", outcome.bytes));
    report.detail(format!("sha256={}", outcome.sha256));
    report.detail(format!("overwrote={}", outcome.overwrote));
}

/// Runs packaging and records the outcome in the audit log either way.
pub(crate) fn package_and_audit(
    paths: &ProjectPaths,
    cfg: &HookConfig,
    ctx: Option<&BuildContext>,
    opts: &PackageOptions,
) -> Result<PackageOutcome> {
    let artifact = resolve_in_project(paths, &opts.artifact);
    match package(paths, cfg, ctx, &artifact, opts.no_clobber) {
        Ok(outcome) => {
            record(paths, "package", "ok", &outcome.file_name);
            Ok(outcome)
        }
        Err(err) => {
            let status = err
                .downcast_ref::<BuildHookError>()
                .map(BuildHookError::code)
                .unwrap_or("ERROR");
            record(paths, "package", status, &format!("{err:#}"));
            Err(err)
        }
    }
}

pub fn run(opts: &PackageOptions) -> Result<CommandReport> {
    let (paths, cfg) = setup(opts.project_dir.as_deref())?;
    let mut report = CommandReport::new("package");

    let ctx = context::load(&paths.context_file)?;
    let outcome = package_and_audit(&paths, &cfg, ctx.as_ref(), opts)?;
    describe_outcome(&mut report, &paths, &outcome);

    Ok(report)
}
