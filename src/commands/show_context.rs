use anyhow::Result;
use std::path::PathBuf;

use crate::commands::{CommandReport, display_relative, setup};
use crate::hooks::context;
use crate::hooks::package::{artifact_file_name, resolve_build_id, resolve_release};

#[derive(Debug, Clone, Default)]
pub struct ShowContextOptions {
    pub project_dir: Option<PathBuf>,
}

/// Read-only view of what the next `package` run would use.
pub fn run(opts: &ShowContextOptions) -> Result<CommandReport> {
    let (paths, cfg) = setup(opts.project_dir.as_deref())?;
    let mut report = CommandReport::new("show-context");

    report.detail(format!("project_dir={}", paths.project_dir.display()));
    report.detail(format!("state_dir={}", display_relative(&paths, &paths.state_dir)));
    report.detail(format!(
        "config_header={}",
        display_relative(&paths, &paths.config_header(&cfg))
    ));
    report.detail(format!(
        "dist_dir={}",
        display_relative(&paths, &paths.dist_dir(&cfg))
    ));

    // Same resolution as `package`, so the predicted name is the one it writes.
    let release = match resolve_release(&paths, &cfg) {
        Ok((release, false)) => release,
        Ok((fallback, true)) => {
            report.issue(format!(
                "no `{}` define in {}",
                cfg.release_macro,
                display_relative(&paths, &paths.config_header(&cfg))
            ));
            fallback
        }
        Err(err) => {
            report.issue(format!("{err:#}"));
            cfg.fallback.clone()
        }
    };
    report.detail(format!("release={release}"));

    let ctx = context::load(&paths.context_file)?;
    let (build_id, build_id_fallback) = resolve_build_id(&paths, &cfg, ctx.as_ref())?;
    if build_id_fallback {
        report.issue(format!(
            "no build id in {}; run `build-id` first",
            display_relative(&paths, &paths.context_file)
        ));
    }
    report.detail(format!("build_id={build_id}"));

    if let Some(ctx) = &ctx {
        if let Some(ts) = &ctx.timestamp {
            report.detail(format!("timestamp={ts}"));
        }
        for define in &ctx.defines {
            report.detail(format!("define {}={}", define.name, define.value));
        }
    }

    report.detail(format!(
        "next_artifact={}",
        artifact_file_name(&cfg.product_prefix, &release, &build_id)
    ));
    Ok(report)
}
