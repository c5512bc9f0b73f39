use anyhow::Result;
use std::path::PathBuf;

use crate::commands::build_id::resolve_timestamp;
use crate::commands::package::{PackageOptions, describe_outcome, package_and_audit};
use crate::commands::{CommandReport, record, setup};
use crate::hooks::build_id::generate;
use crate::hooks::context::{self, BuildContext};

#[derive(Debug, Clone, Default)]
pub struct PipelineOptions {
    pub project_dir: Option<PathBuf>,
    pub artifact: PathBuf,
    pub timestamp: Option<String>,
    pub no_clobber: bool,
}

/// Both stages in one process: the generator writes the context, packaging
/// reads the same value.
pub fn run(opts: &PipelineOptions) -> Result<CommandReport> {
    let (paths, cfg) = setup(opts.project_dir.as_deref())?;
    let mut report = CommandReport::new("pipeline");

    let timestamp = resolve_timestamp(opts.timestamp.as_deref());
    let mut ctx = BuildContext::default();
    let build_id = generate(&mut ctx, &timestamp);
    report.detail(format!("timestamp={timestamp}"));

    context::save(&paths.context_file, &mut ctx)?;
    record(&paths, "build-id", "ok", &build_id.hex());

    let package_opts = PackageOptions {
        project_dir: opts.project_dir.clone(),
        artifact: opts.artifact.clone(),
        no_clobber: opts.no_clobber,
    };
    let outcome = package_and_audit(&paths, &cfg, Some(&ctx), &package_opts)?;
    describe_outcome(&mut report, &paths, &outcome);

    Ok(report)
}
