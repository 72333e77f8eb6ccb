//! Empty placeholder input file shared by importer smoke tests.

use anyhow::{Context, Result};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct ScratchFile {
    path: PathBuf,
}

impl ScratchFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the file, or truncate what the last command left in it.
    pub fn reset(&self) -> Result<()> {
        fs::write(&self.path, b"")
            .with_context(|| format!("recreating scratch file '{}'", self.path.display()))
    }

    /// Remove the file; a file that is already gone is fine.
    pub fn remove(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            other => other
                .with_context(|| format!("removing scratch file '{}'", self.path.display())),
        }
    }
}
