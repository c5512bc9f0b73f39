use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::commands;
use crate::hooks::build_id::{render_flags, render_header};
use crate::hooks::context::BUILD_ID_KEY;

#[derive(Debug, Parser)]
#[command(name = "spojboard-build")]
#[command(about = "Build-ID generation and release packaging hooks for SpojBoard firmware")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true)]
    pub json: bool,

    /// Firmware project root; defaults to SPOJBOARD_PROJECT_DIR, then the current directory.
    #[arg(long, global = true, value_name = "DIR")]
    pub project_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Derive the build id and emit the compiler defines.
    BuildId(BuildIdArgs),
    /// Copy the linked binary into the dist directory under its release name.
    Package(PackageArgs),
    /// Run build-id and package back to back.
    Pipeline(PipelineArgs),
    /// Show the build context and the artifact name the next package run would use.
    ShowContext,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum BuildIdFormat {
    #[default]
    Report,
    /// Compiler flags on one line, for dynamic build_flags.
    Flags,
    /// A C header with one #define per value.
    Header,
    /// FIRMWARE_BUILD_ID=<hex>
    Env,
}

#[derive(Debug, Args)]
pub struct BuildIdArgs {
    /// Hash this text instead of the current time (format: "%b %d %Y%H:%M:%S").
    #[arg(long)]
    pub timestamp: Option<String>,
    #[arg(long, value_enum, default_value_t = BuildIdFormat::Report)]
    pub format: BuildIdFormat,
    /// Also write the defines as a C header to this path.
    #[arg(long, value_name = "FILE")]
    pub header_out: Option<PathBuf>,
    /// Do not persist the build context for a later package run.
    #[arg(long)]
    pub no_save: bool,
}

#[derive(Debug, Args)]
pub struct PackageArgs {
    /// The linked firmware binary; relative paths are taken from the project root.
    #[arg(long, value_name = "FILE")]
    pub artifact: PathBuf,
    /// Fail instead of overwriting an existing artifact with the same name.
    #[arg(long)]
    pub no_clobber: bool,
}

#[derive(Debug, Args)]
pub struct PipelineArgs {
    #[arg(long, value_name = "FILE")]
    pub artifact: PathBuf,
    #[arg(long)]
    pub timestamp: Option<String>,
    #[arg(long)]
    pub no_clobber: bool,
}

fn print_report(report: &commands::CommandReport, as_json: bool) -> Result<()> {
    if as_json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    println!("command: {}", report.command);
    println!("ok: {}", report.ok);
    if !report.details.is_empty() {
        println!("details:");
        for detail in &report.details {
            println!("- {detail}");
        }
    }
    if !report.issues.is_empty() {
        println!("issues:");
        for issue in &report.issues {
            println!("- {issue}");
        }
    }
    Ok(())
}

pub fn run() -> Result<()> {
    crate::env_loader::load_dotenv();
    let cli = Cli::parse();
    let project_dir = cli.project_dir.clone();

    let report = match &cli.command {
        Command::BuildId(args) => {
            let out = commands::build_id::run(&commands::build_id::BuildIdOptions {
                project_dir,
                timestamp: args.timestamp.clone(),
                header_out: args.header_out.clone(),
                no_save: args.no_save,
            })?;
            match args.format {
                BuildIdFormat::Report => out.report,
                BuildIdFormat::Flags => {
                    println!("{}", render_flags(&out.defines));
                    return Ok(());
                }
                BuildIdFormat::Header => {
                    print!("{}", render_header(&out.defines));
                    return Ok(());
                }
                BuildIdFormat::Env => {
                    println!("{BUILD_ID_KEY}={}", out.build_id);
                    return Ok(());
                }
            }
        }
        Command::Package(args) => commands::package::run(&commands::package::PackageOptions {
            project_dir,
            artifact: args.artifact.clone(),
            no_clobber: args.no_clobber,
        })?,
        Command::Pipeline(args) => commands::pipeline::run(&commands::pipeline::PipelineOptions {
            project_dir,
            artifact: args.artifact.clone(),
            timestamp: args.timestamp.clone(),
            no_clobber: args.no_clobber,
        })?,
        Command::ShowContext => {
            commands::show_context::run(&commands::show_context::ShowContextOptions {
                project_dir,
            })?
        }
    };

    print_report(&report, cli.json)?;

    if report.ok {
        Ok(())
    } else {
        std::process::exit(2);
    }
}
