use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

use netmeld_devtools::logging;
use netmeld_devtools::smoke::{run_profile, BuiltinProfile, Profile};

/// Run installed Netmeld tools and check their exit codes.
///
/// Exits 0 only if every command returned an accepted code.
#[derive(Debug, Parser)]
#[command(name = "netmeld-smoke-test", version)]
struct Cli {
    /// Built-in environment profile
    #[arg(long, value_enum, default_value = "container", conflicts_with = "profile_file")]
    profile: BuiltinProfile,

    /// TOML profile file instead of a built-in profile
    #[arg(long)]
    profile_file: Option<PathBuf>,

    /// Pass --pipe to importers
    #[arg(long)]
    pipe: bool,

    /// Write the per-command outcomes as JSON
    #[arg(long)]
    report: Option<PathBuf>,

    /// Log command output
    #[arg(short, long)]
    verbose: bool,
}

fn run(cli: Cli) -> Result<i32> {
    let mut profile = match &cli.profile_file {
        Some(path) => Profile::load(path)?,
        None => Profile::builtin(cli.profile),
    };
    if cli.pipe {
        profile.pipe = true;
    }

    tracing::info!("Running smoke-test profile '{}'", profile.name);
    let report = run_profile(&profile)?;
    if let Some(path) = &cli.report {
        report.write_json(path)?;
    }
    Ok(report.exit_code())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match run(cli) {
        Ok(0) => ExitCode::SUCCESS,
        Ok(_) => ExitCode::from(1),
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
