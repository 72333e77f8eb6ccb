//! Dockerfile generation for the Netmeld packaging flavors.
//!
//! Each [`Module`] maps to one fixed instruction sequence. Generation is a
//! pure function of the module and [`GenerateOptions`]; nothing is read from
//! the host.
//!
//! # Example
//!
//! ```rust
//! use netmeld_devtools::dockerfile::{generate, render, GenerateOptions, Module};
//!
//! let text = render(&generate(Module::Clw, GenerateOptions::default()));
//! assert!(text.ends_with("USER netmeld\nCMD [\"/bin/bash\"]\n"));
//! ```

pub mod apt;
mod modules;

use anyhow::bail;
use std::fmt;
use std::str::FromStr;

pub const BASE_IMAGE: &str = "debian:testing-slim";
pub const IMAGE_USER: &str = "netmeld";
pub const IMAGE_HOME: &str = "/home/netmeld";

/// Packaging profiles the generator knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum Module {
    All,
    Clw,
    Datalake,
    DatastoreAll,
    #[value(name = "datastore-db")]
    DatastoreDb,
    DatastoreTools,
    Development,
    Fetchers,
    #[value(name = "playbook-nodb")]
    PlaybookNoDb,
    Tester,
}

impl Module {
    pub const ALL: [Module; 10] = [
        Module::All,
        Module::Clw,
        Module::Datalake,
        Module::DatastoreAll,
        Module::DatastoreDb,
        Module::DatastoreTools,
        Module::Development,
        Module::Fetchers,
        Module::PlaybookNoDb,
        Module::Tester,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Module::All => "all",
            Module::Clw => "clw",
            Module::Datalake => "datalake",
            Module::DatastoreAll => "datastore-all",
            Module::DatastoreDb => "datastore-db",
            Module::DatastoreTools => "datastore-tools",
            Module::Development => "development",
            Module::Fetchers => "fetchers",
            Module::PlaybookNoDb => "playbook-nodb",
            Module::Tester => "tester",
        }
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Module {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match Module::ALL.iter().find(|m| m.as_str() == s) {
            Some(module) => Ok(*module),
            None => {
                let known = Module::ALL.map(Module::as_str).join(", ");
                bail!("unknown module '{}'; expected one of: {}", s, known)
            }
        }
    }
}

/// Caller-controlled generation switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenerateOptions {
    /// Leave the final image user as root.
    pub stay_root: bool,
}

/// A single Dockerfile instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    From(String),
    Env { key: String, value: String },
    Run(String),
    Workdir(String),
    Copy { src: String, dest: String },
    User(String),
    /// Exec form, rendered as a JSON array.
    Entrypoint(Vec<String>),
    /// Exec form, rendered as a JSON array.
    Cmd(Vec<String>),
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::From(image) => write!(f, "FROM {image}"),
            Instruction::Env { key, value } => write!(f, "ENV {key} {value}"),
            Instruction::Run(line) => write!(f, "RUN {line}"),
            Instruction::Workdir(dir) => write!(f, "WORKDIR {dir}"),
            Instruction::Copy { src, dest } => write!(f, "COPY {src} {dest}"),
            Instruction::User(user) => write!(f, "USER {user}"),
            Instruction::Entrypoint(argv) => write!(f, "ENTRYPOINT {}", exec_form(argv)),
            Instruction::Cmd(argv) => write!(f, "CMD {}", exec_form(argv)),
        }
    }
}

fn exec_form(argv: &[String]) -> String {
    let quoted: Vec<String> = argv
        .iter()
        .map(|arg| serde_json::Value::String(arg.clone()).to_string())
        .collect();
    format!("[{}]", quoted.join(", "))
}

/// Instruction sequence for `module`.
pub fn generate(module: Module, options: GenerateOptions) -> Vec<Instruction> {
    modules::build(module, options)
}

/// Render instructions as Dockerfile text, one per line.
pub fn render(instructions: &[Instruction]) -> String {
    let mut out = String::new();
    for instruction in instructions {
        out.push_str(&instruction.to_string());
        out.push('\n');
    }
    out
}
