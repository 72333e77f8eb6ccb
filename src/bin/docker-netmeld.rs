use clap::Parser;
use std::io::Write;
use std::process::ExitCode;

use netmeld_devtools::dockerfile::{generate, render, GenerateOptions, Module};

/// Generate Dockerfile code for Netmeld tooling.
#[derive(Debug, Parser)]
#[command(
    name = "docker-netmeld",
    version,
    after_help = "Report bugs to <Netmeld@sandia.gov>."
)]
struct Cli {
    /// Generate this module's Dockerfile
    #[arg(value_enum)]
    module: Module,

    /// Leave as root for user
    #[arg(short = 'r', long = "root")]
    root: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let text = render(&generate(
        cli.module,
        GenerateOptions {
            stay_root: cli.root,
        },
    ));

    let mut stdout = std::io::stdout().lock();
    match stdout.write_all(text.as_bytes()).and_then(|()| stdout.flush()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: writing Dockerfile: {e}");
            ExitCode::FAILURE
        }
    }
}
