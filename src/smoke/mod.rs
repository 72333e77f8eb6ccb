//! Smoke tests for installed Netmeld tools.
//!
//! A smoke test only checks that a program ran and exited with one of the
//! codes its [`CommandSpec`] accepts. Commands run one after another; a
//! failure is recorded and the run carries on so a single report covers
//! every tool.
//!
//! # Example
//!
//! ```rust
//! use netmeld_devtools::smoke::{run_commands, CommandSpec, ScratchFile};
//!
//! let scratch = ScratchFile::new(std::env::temp_dir().join("netmeld-smoke-doc"));
//! let report = run_commands(&[CommandSpec::new(["true"])], &scratch);
//! assert_eq!(report.exit_code(), 0);
//! ```

pub mod command;
pub mod profile;
pub mod scratch;
pub mod suites;

pub use command::CommandSpec;
pub use profile::{BuiltinProfile, DatabaseSettings, Profile};
pub use scratch::ScratchFile;
pub use suites::Suite;

use anyhow::{bail, Context, Result};
use serde::Serialize;
use std::fs;
use std::path::Path;

use crate::process::Cmd;

/// What happened to one command.
#[derive(Debug, Clone, Serialize)]
pub struct CommandOutcome {
    pub command: String,
    /// `None` if the process never started or died from a signal.
    pub code: Option<i32>,
    pub accepted: Vec<i32>,
    pub passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Outcomes of a whole run, in execution order.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub profile: String,
    pub outcomes: Vec<CommandOutcome>,
}

impl RunReport {
    pub fn success(&self) -> bool {
        self.outcomes.iter().all(|o| o.passed)
    }

    pub fn failures(&self) -> impl Iterator<Item = &CommandOutcome> {
        self.outcomes.iter().filter(|o| !o.passed)
    }

    pub fn exit_code(&self) -> i32 {
        if self.success() {
            0
        } else {
            1
        }
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("serializing smoke-test report")?;
        fs::write(path, json)
            .with_context(|| format!("writing smoke-test report '{}'", path.display()))
    }
}

fn execute(spec: &CommandSpec) -> Result<crate::process::CommandResult> {
    let Some((program, args)) = spec.args.split_first() else {
        bail!("command has no program");
    };
    let mut cmd = Cmd::new(program).args(args).allow_fail();
    if let Some(bytes) = &spec.stdin {
        cmd = cmd.stdin_bytes(bytes.clone());
    }
    cmd.run()
}

/// Run one command and judge its exit code.
pub fn run_command(spec: &CommandSpec, scratch: &ScratchFile) -> CommandOutcome {
    let command = spec.display();
    tracing::info!("Testing with: {command}");

    let result = if spec.uses_scratch {
        scratch.reset().and_then(|()| execute(spec))
    } else {
        execute(spec)
    };
    if spec.uses_scratch {
        if let Err(e) = scratch.remove() {
            tracing::warn!("{e:#}");
        }
    }

    let accepted: Vec<i32> = spec.accepted.iter().copied().collect();
    match result {
        Ok(output) => {
            let code = output.code();
            tracing::debug!("out: {}", output.stdout);
            tracing::debug!("err: {}", output.stderr);
            tracing::debug!("rtc: {:?}", code);

            let passed = code.is_some_and(|c| spec.is_accepted(c));
            if !passed {
                tracing::warn!(
                    "Command returned unexpected status {:?} (accepted {:?}): {}",
                    code,
                    accepted,
                    output.stderr.trim()
                );
            }
            CommandOutcome {
                command,
                code,
                accepted,
                passed,
                error: None,
            }
        }
        Err(e) => {
            tracing::warn!("Command could not be run: {e:#}");
            CommandOutcome {
                command,
                code: None,
                accepted,
                passed: false,
                error: Some(format!("{e:#}")),
            }
        }
    }
}

/// Run every command in order, never stopping early.
pub fn run_commands(commands: &[CommandSpec], scratch: &ScratchFile) -> RunReport {
    run_named("adhoc", commands, scratch)
}

fn run_named(profile: &str, commands: &[CommandSpec], scratch: &ScratchFile) -> RunReport {
    let outcomes: Vec<CommandOutcome> = commands
        .iter()
        .map(|spec| run_command(spec, scratch))
        .collect();
    let report = RunReport {
        profile: profile.to_string(),
        outcomes,
    };

    if report.success() {
        tracing::info!("All commands returned expected values");
    } else {
        tracing::info!(
            "{} of {} commands returned an unexpected value",
            report.failures().count(),
            report.outcomes.len()
        );
    }
    report
}

/// Setup commands first (not judged), then the profile's command list.
pub fn run_profile(profile: &Profile) -> Result<RunReport> {
    let commands = profile.commands()?;
    let scratch = ScratchFile::new(&profile.scratch_file);

    for setup in &profile.setup {
        let outcome = run_command(setup, &scratch);
        if !outcome.passed {
            tracing::info!("setup step '{}' did not succeed; continuing", outcome.command);
        }
    }

    Ok(run_named(&profile.name, &commands, &scratch))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn scratch(tmp: &TempDir) -> ScratchFile {
        ScratchFile::new(tmp.path().join("blank"))
    }

    #[test]
    fn test_all_accepted_is_success() {
        let tmp = TempDir::new().unwrap();
        let report = run_commands(
            &[
                CommandSpec::new(["true"]),
                CommandSpec::new(["sh", "-c", "exit 80"]).accept([0, 80]),
                CommandSpec::new(["false"]).accept([1]),
            ],
            &scratch(&tmp),
        );
        assert!(report.success());
        assert_eq!(report.exit_code(), 0);
    }

    #[test]
    fn test_true_then_false_fails() {
        let tmp = TempDir::new().unwrap();
        let report = run_commands(
            &[CommandSpec::new(["true"]), CommandSpec::new(["false"])],
            &scratch(&tmp),
        );
        assert_eq!(report.exit_code(), 1);
        assert!(report.outcomes[0].passed);
        assert!(!report.outcomes[1].passed);
        assert_eq!(report.outcomes[1].code, Some(1));
    }

    #[test]
    fn test_failure_does_not_abort_remaining_commands() {
        let tmp = TempDir::new().unwrap();
        let marker = tmp.path().join("ran");
        let report = run_commands(
            &[
                CommandSpec::new(["false"]),
                CommandSpec::new(["touch".to_string(), marker.to_string_lossy().into_owned()]),
            ],
            &scratch(&tmp),
        );
        assert_eq!(report.outcomes.len(), 2);
        assert!(marker.exists());
        assert_eq!(report.failures().count(), 1);
    }

    #[test]
    fn test_missing_program_is_failure_not_panic() {
        let tmp = TempDir::new().unwrap();
        let report = run_commands(
            &[
                CommandSpec::new(["definitely_not_a_real_command_12345"]),
                CommandSpec::new(Vec::<String>::new()),
            ],
            &scratch(&tmp),
        );
        assert!(report.outcomes.iter().all(|o| !o.passed && o.code.is_none()));
        assert!(report.outcomes.iter().all(|o| o.error.is_some()));
    }

    #[test]
    fn test_stdin_is_delivered() {
        let tmp = TempDir::new().unwrap();
        let spec = CommandSpec::new(["sh", "-c", "read answer && test \"$answer\" = n"]).stdin("n\n");
        let outcome = run_command(&spec, &scratch(&tmp));
        assert!(outcome.passed);
    }

    #[test]
    fn test_scratch_exists_only_during_command() {
        let tmp = TempDir::new().unwrap();
        let scratch = scratch(&tmp);
        let path = scratch.path().to_string_lossy().into_owned();
        fs::write(scratch.path(), "stale").unwrap();

        let spec = CommandSpec::new(["sh", "-c", "test -f \"$0\" && test ! -s \"$0\"", path.as_str()])
            .with_scratch();
        let outcome = run_command(&spec, &scratch);
        assert!(outcome.passed);
        assert!(!scratch.path().exists());
    }

    #[test]
    fn test_profile_runs_setup_without_judging_it() {
        let tmp = TempDir::new().unwrap();
        let profile = Profile {
            name: "unit".to_string(),
            database: None,
            pipe: false,
            device_id: "test".to_string(),
            default_accepted: command::default_accepted(),
            scratch_file: tmp.path().join("blank"),
            setup: vec![CommandSpec::new(["false"])],
            suites: Vec::new(),
            commands: vec![CommandSpec::new(["true"])],
        };
        let report = run_profile(&profile).unwrap();
        assert_eq!(report.profile, "unit");
        assert_eq!(report.outcomes.len(), 1);
        assert!(report.success());
    }

    #[test]
    fn test_report_json() {
        let tmp = TempDir::new().unwrap();
        let report = run_commands(&[CommandSpec::new(["false"])], &scratch(&tmp));
        let path = tmp.path().join("report.json");
        report.write_json(&path).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["outcomes"][0]["command"], "false");
        assert_eq!(value["outcomes"][0]["code"], 1);
        assert_eq!(value["outcomes"][0]["passed"], false);
        assert!(value["outcomes"][0].get("error").is_none());
    }
}
