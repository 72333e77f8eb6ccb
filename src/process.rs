//! Structured subprocess invocation.
//!
//! Every external program is started from an argument vector; nothing is
//! routed through a shell. [`Cmd`] captures stdout and stderr, optionally
//! feeds stdin, and turns a non-zero exit into an error unless
//! [`Cmd::allow_fail`] was requested.
//!
//! ```rust,ignore
//! use netmeld_devtools::process::Cmd;
//!
//! let result = Cmd::new("dot")
//!     .args(["-Tpng", "-o", "out.png", "graph.dot"])
//!     .error_msg("dot rendering failed")
//!     .run()?;
//! assert!(result.success());
//! ```

use anyhow::{bail, Context, Result};
use std::ffi::{OsStr, OsString};
use std::io::{ErrorKind, Write};
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};

/// Captured result of a finished process.
#[derive(Debug, Clone)]
pub struct CommandResult {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

impl CommandResult {
    pub fn success(&self) -> bool {
        self.status.success()
    }

    /// Exit code, or `None` when the process was killed by a signal.
    pub fn code(&self) -> Option<i32> {
        self.status.code()
    }
}

/// Builder for a single external program invocation.
#[derive(Debug, Clone)]
pub struct Cmd {
    program: OsString,
    args: Vec<OsString>,
    stdin: Option<Vec<u8>>,
    error_msg: Option<String>,
    allow_fail: bool,
}

impl Cmd {
    pub fn new(program: impl AsRef<OsStr>) -> Self {
        Self {
            program: program.as_ref().to_os_string(),
            args: Vec::new(),
            stdin: None,
            error_msg: None,
            allow_fail: false,
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    pub fn arg_path(self, path: &Path) -> Self {
        self.arg(path.as_os_str())
    }

    /// Bytes written to the child's stdin before it is closed.
    pub fn stdin_bytes(mut self, bytes: impl Into<Vec<u8>>) -> Self {
        self.stdin = Some(bytes.into());
        self
    }

    /// Message used when the command exits unsuccessfully.
    pub fn error_msg(mut self, msg: &str) -> Self {
        self.error_msg = Some(msg.to_string());
        self
    }

    /// Return the result even if the exit status is non-zero.
    pub fn allow_fail(mut self) -> Self {
        self.allow_fail = true;
        self
    }

    /// Human readable rendering of the argument vector, for logs only.
    pub fn display(&self) -> String {
        std::iter::once(&self.program)
            .chain(self.args.iter())
            .map(|part| part.to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Run to completion, capturing stdout and stderr.
    pub fn run(self) -> Result<CommandResult> {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .stdin(if self.stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = command
            .spawn()
            .with_context(|| format!("spawning '{}'", self.display()))?;

        // Written from a separate thread so a child that fills its stdout
        // pipe before draining stdin cannot deadlock us.
        let writer = match (self.stdin.clone(), child.stdin.take()) {
            (Some(bytes), Some(mut pipe)) => Some(std::thread::spawn(move || {
                match pipe.write_all(&bytes) {
                    Err(e) if e.kind() == ErrorKind::BrokenPipe => Ok(()),
                    other => other,
                }
            })),
            _ => None,
        };

        let output = child
            .wait_with_output()
            .with_context(|| format!("waiting for '{}'", self.display()))?;

        if let Some(writer) = writer {
            match writer.join() {
                Ok(written) => written
                    .with_context(|| format!("writing stdin of '{}'", self.display()))?,
                Err(_) => bail!("stdin writer for '{}' panicked", self.display()),
            }
        }

        let result = CommandResult {
            status: output.status,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        if !self.allow_fail && !result.success() {
            let msg = match &self.error_msg {
                Some(msg) => msg.clone(),
                None => format!("'{}' failed", self.display()),
            };
            bail!(
                "{} (status {}): {}",
                msg,
                result.status,
                result.stderr.trim()
            );
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_captures_stdout() {
        let result = Cmd::new("sh").args(["-c", "echo hello"]).run().unwrap();
        assert!(result.success());
        assert_eq!(result.stdout, "hello\n");
    }

    #[test]
    fn test_failure_is_error_by_default() {
        let err = Cmd::new("false").error_msg("false failed").run().unwrap_err();
        assert!(err.to_string().contains("false failed"));
    }

    #[test]
    fn test_failure_without_message_names_command() {
        let err = Cmd::new("sh").args(["-c", "echo boom >&2; exit 3"]).run().unwrap_err();
        let text = err.to_string();
        assert!(text.starts_with("'sh -c echo boom >&2; exit 3' failed"), "{text}");
        assert!(text.ends_with(": boom"), "{text}");

        let err = Cmd::new("false").run().unwrap_err();
        assert!(err.to_string().starts_with("'false' failed"));
    }

    #[test]
    fn test_allow_fail_returns_code() {
        let result = Cmd::new("sh")
            .args(["-c", "exit 80"])
            .allow_fail()
            .run()
            .unwrap();
        assert_eq!(result.code(), Some(80));
    }

    #[test]
    fn test_stdin_is_fed() {
        let result = Cmd::new("cat").stdin_bytes("n\n").run().unwrap();
        assert_eq!(result.stdout, "n\n");
    }

    #[test]
    fn test_stdin_ignored_by_child_is_not_an_error() {
        let result = Cmd::new("true")
            .stdin_bytes("y\n".repeat(100_000))
            .run()
            .unwrap();
        assert!(result.success());
    }

    #[test]
    fn test_spawn_failure_is_error() {
        assert!(Cmd::new("definitely_not_a_real_command_12345").run().is_err());
    }

    #[test]
    fn test_display_joins_arguments() {
        let cmd = Cmd::new("dot").args(["-Tpdf", "-o", "a.pdf", "a.dot"]);
        assert_eq!(cmd.display(), "dot -Tpdf -o a.pdf a.dot");
    }
}
