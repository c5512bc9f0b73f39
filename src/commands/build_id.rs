use anyhow::{Context, Result};
use std::env;
use std::fs;
use std::path::PathBuf;

use crate::commands::{CommandReport, display_relative, record, resolve_in_project, setup};
use crate::hooks::build_id::{BuildId, Define, generate, local_build_timestamp, render_header};
use crate::hooks::context::{self, BuildContext};

#[derive(Debug, Clone, Default)]
pub struct BuildIdOptions {
    pub project_dir: Option<PathBuf>,
    pub timestamp: Option<String>,
    pub header_out: Option<PathBuf>,
    pub no_save: bool,
}

#[derive(Debug, Clone)]
pub struct BuildIdOutput {
    pub report: CommandReport,
    pub build_id: BuildId,
    pub defines: Vec<Define>,
}

/// Explicit flag, then `SPOJBOARD_BUILD_TIMESTAMP`, then the local clock.
pub fn resolve_timestamp(explicit: Option<&str>) -> String {
    if let Some(ts) = explicit {
        return ts.to_string();
    }
    match env::var("SPOJBOARD_BUILD_TIMESTAMP") {
        Ok(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => local_build_timestamp(),
    }
}

pub fn run(opts: &BuildIdOptions) -> Result<BuildIdOutput> {
    let (paths, _cfg) = setup(opts.project_dir.as_deref())?;
    let mut report = CommandReport::new("build-id");

    let timestamp = resolve_timestamp(opts.timestamp.as_deref());
    let mut ctx = BuildContext::default();
    let build_id = generate(&mut ctx, &timestamp);

    report.detail(format!("timestamp={timestamp}"));
    report.detail(format!("build_id={build_id}"));
    for define in &ctx.defines {
        report.detail(format!("define {}={}", define.name, define.value));
    }

    if let Some(header_out) = &opts.header_out {
        let target = resolve_in_project(&paths, header_out);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        fs::write(&target, render_header(&ctx.defines))
            .with_context(|| format!("failed to write {}", target.display()))?;
        report.detail(format!("header={}", display_relative(&paths, &target)));
    }

    if opts.no_save {
        // A context left by an earlier build would name this build's artifact.
        if context::remove(&paths.context_file)? {
            report.detail(format!(
                "no-save: removed previous {}",
                display_relative(&paths, &paths.context_file)
            ));
        } else {
            report.detail("no-save: build context not written".to_string());
        }
    } else {
        context::save(&paths.context_file, &mut ctx)?;
        report.detail(format!("context={}", display_relative(&paths, &paths.context_file)));
        record(&paths, "build-id", "ok", &build_id.hex());
    }

    Ok(BuildIdOutput {
        report,
        build_id,
        defines: ctx.defines,
    })
}
