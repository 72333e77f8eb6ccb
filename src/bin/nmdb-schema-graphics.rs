use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

use netmeld_devtools::graphics::{generate_all, GraphicsConfig};
use netmeld_devtools::logging;

/// Regenerate the Netmeld Datastore flow graph and schema diagrams.
///
/// Drops and recreates the target database from the schema directory.
#[derive(Debug, Parser)]
#[command(name = "nmdb-schema-graphics", version)]
struct Cli {
    /// Scratch database to (re-)initialize and document
    #[arg(long, default_value = "site")]
    db_name: String,

    /// Namespace whose view dependencies are drawn
    #[arg(long, default_value = "public")]
    db_namespace: String,

    /// Datastore schema directory passed to nmdb-initialize
    #[arg(long, default_value = "../common/schemas/")]
    schema_dir: PathBuf,

    /// Datastore source tree holding the tool directories and common/
    #[arg(long, default_value = "..")]
    source_root: PathBuf,

    /// Flow graph template (bundled template when omitted)
    #[arg(long)]
    template: Option<PathBuf>,

    /// Where .dot files and renderings are written
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl From<Cli> for GraphicsConfig {
    fn from(cli: Cli) -> Self {
        GraphicsConfig {
            db_name: cli.db_name,
            db_namespace: cli.db_namespace,
            schema_dir: cli.schema_dir,
            source_root: cli.source_root,
            template: cli.template,
            output_dir: cli.output_dir,
        }
    }
}

fn run(cli: Cli) -> Result<bool> {
    let config = GraphicsConfig::from(cli);
    let report = generate_all(&config)?;

    for failure in &report.render_failures {
        eprintln!("  [FAIL] {}", failure.output.display());
    }
    Ok(report.success())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
