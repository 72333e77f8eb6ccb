//! Graphviz rendering of generated `.dot` files.

use anyhow::Result;
use std::path::{Path, PathBuf};

use crate::process::Cmd;

pub const FORMATS: &[&str] = &["pdf", "png", "svg"];

/// Sibling of `dot_file` with its extension replaced by `format`.
pub fn output_path(dot_file: &Path, format: &str) -> PathBuf {
    dot_file.with_extension(format)
}

/// A render that did not produce its output.
#[derive(Debug)]
pub struct RenderFailure {
    pub output: PathBuf,
    pub error: anyhow::Error,
}

pub fn render_one(dot_file: &Path, format: &str) -> Result<PathBuf> {
    render_with(&Cmd::new("dot"), dot_file, format)
}

fn render_with(program: &Cmd, dot_file: &Path, format: &str) -> Result<PathBuf> {
    let output = output_path(dot_file, format);
    program
        .clone()
        .arg(format!("-T{format}"))
        .arg("-o")
        .arg_path(&output)
        .arg_path(dot_file)
        .error_msg(&format!(
            "dot failed rendering '{}' as {}",
            dot_file.display(),
            format
        ))
        .run()?;
    Ok(output)
}

/// Render every file in every format. A failed render does not stop the
/// others; failures are returned for the caller to report.
pub fn render_all(dot_files: &[PathBuf]) -> Vec<RenderFailure> {
    let mut failures = Vec::new();
    for dot_file in dot_files {
        println!("- Processing {}", dot_file.display());
        for format in FORMATS {
            let output = output_path(dot_file, format);
            println!("  - {}", output.display());
            if let Err(error) = render_one(dot_file, format) {
                tracing::error!("{error:#}");
                failures.push(RenderFailure { output, error });
            }
        }
    }
    failures
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_output_path_replaces_extension() {
        assert_eq!(
            output_path(Path::new("out/site_tables-and-views.dot"), "svg"),
            PathBuf::from("out/site_tables-and-views.svg")
        );
        assert_eq!(
            output_path(Path::new("netmeld-datastore.dot"), "pdf"),
            PathBuf::from("netmeld-datastore.pdf")
        );
    }

    #[test]
    fn test_render_all_reports_every_failure() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("missing.dot");
        let failures = render_all(&[missing]);
        // Missing input fails whether or not graphviz is installed.
        assert_eq!(failures.len(), FORMATS.len());
        assert_eq!(failures[0].output, tmp.path().join("missing.pdf"));
        assert_eq!(failures[2].output, tmp.path().join("missing.svg"));
    }

    #[test]
    fn test_render_passes_format_and_output() {
        let tmp = TempDir::new().unwrap();
        let script = tmp.path().join("dot.sh");
        // -T<fmt> -o OUT FILE
        fs::write(&script, "printf '%s\n' \"$1\" > \"$3\"\ncat \"$4\" >> \"$3\"\n").unwrap();
        let dot = tmp.path().join("g.dot");
        fs::write(&dot, "digraph g {}\n").unwrap();

        let out = render_with(&Cmd::new("sh").arg_path(&script), &dot, "png").unwrap();
        assert_eq!(out, tmp.path().join("g.png"));
        assert_eq!(fs::read_to_string(out).unwrap(), "-Tpng\ndigraph g {}\n");
    }

    #[test]
    fn test_render_one_when_graphviz_present() {
        if !crate::preflight::command_exists("dot") {
            return;
        }
        let tmp = TempDir::new().unwrap();
        let dot = tmp.path().join("g.dot");
        fs::write(&dot, "digraph g { a -> b; }\n").unwrap();
        let out = render_one(&dot, "svg").unwrap();
        assert!(fs::read_to_string(out).unwrap().contains("<svg"));
    }
}
