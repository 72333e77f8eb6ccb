//! Preflight checks for host tools.
//!
//! The diagram generator drives several external programs and mutates a
//! database on the way; checking for every tool up front keeps a missing
//! `dot` from being discovered after the schema has already been reset.
//!
//! # Example
//!
//! ```rust
//! use netmeld_devtools::preflight::{command_exists, check_required_tools};
//!
//! if !command_exists("postgresql_autodoc") {
//!     println!("postgresql-autodoc not installed");
//! }
//!
//! let tools = &[("dot", "graphviz")];
//! if let Err(e) = check_required_tools(tools) {
//!     eprintln!("{}", e);
//! }
//! ```

use anyhow::{bail, Result};

/// Check if a command exists in PATH.
pub fn command_exists(cmd: &str) -> bool {
    which::which(cmd).is_ok()
}

/// Tools the schema/flow diagram generator shells out to.
///
/// Each tuple is (command_name, package_name).
pub const GRAPHICS_TOOLS: &[(&str, &str)] = &[
    ("nmdb-initialize", "netmeld-datastore"),
    ("postgresql_autodoc", "postgresql-autodoc"),
    ("dot", "graphviz"),
];

/// Check that specific tools are available.
///
/// # Returns
///
/// * `Ok(())` if all tools are found
/// * `Err` with list of missing tools and their packages
pub fn check_required_tools(tools: &[(&str, &str)]) -> Result<()> {
    let missing: Vec<_> = tools
        .iter()
        .filter(|(tool, _)| !command_exists(tool))
        .collect();

    if !missing.is_empty() {
        let msg = missing
            .iter()
            .map(|(t, p)| format!("  {} (install: {})", t, p))
            .collect::<Vec<_>>()
            .join("\n");
        bail!("Missing required host tools:\n{}", msg);
    }

    Ok(())
}

/// Check everything in [`GRAPHICS_TOOLS`].
pub fn check_graphics_tools() -> Result<()> {
    check_required_tools(GRAPHICS_TOOLS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_exists() {
        assert!(command_exists("sh"));
        assert!(!command_exists("definitely_not_a_real_command_12345"));
    }

    #[test]
    fn test_check_required_tools_success() {
        let tools = &[("sh", "dash"), ("cat", "coreutils")];
        assert!(check_required_tools(tools).is_ok());
    }

    #[test]
    fn test_check_required_tools_lists_missing() {
        let tools = &[("sh", "dash"), ("nonexistent_command_xyz", "fake-package")];
        let err = check_required_tools(tools).unwrap_err().to_string();
        assert!(err.contains("nonexistent_command_xyz (install: fake-package)"));
        assert!(!err.contains("dash"));
    }
}
