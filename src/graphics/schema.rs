//! Datastore schema diagrams via `postgresql_autodoc`.

use anyhow::{bail, Context, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use super::catalog::ViewDependency;
use crate::process::Cmd;

const AUTODOC: &str = "postgresql_autodoc";

/// Answers fed to `nmdb-initialize` confirmation prompts.
const CONFIRMATION_ANSWERS: usize = 64;

/// Style block separating autodoc's own edges from view dependency edges.
pub const VIEW_EDGE_STYLE: &str = "\nedge\n[\n\t\tstyle = \"dashed\"\n];\n\n";

/// Drop and recreate `db_name` with just the datastore schema.
pub fn reset_database(db_name: &str, schema_dir: &Path) -> Result<()> {
    Cmd::new("nmdb-initialize")
        .args(["--db-name", db_name, "--schema-dir"])
        .arg_path(schema_dir)
        .stdin_bytes("y\n".repeat(CONFIRMATION_ANSWERS))
        .error_msg(&format!("nmdb-initialize failed for database '{db_name}'"))
        .run()?;
    Ok(())
}

/// Run `postgresql_autodoc` in dot mode; it writes `<output_root>.dot`.
fn autodoc(program: &Cmd, db_name: &str, output_root: &Path, extra: &[&str]) -> Result<PathBuf> {
    program
        .clone()
        .args(["-d", db_name, "-f"])
        .arg_path(output_root)
        .args(["-t", "dot"])
        .args(extra)
        .error_msg(&format!("postgresql_autodoc failed for database '{db_name}'"))
        .run()?;

    let mut produced = output_root.as_os_str().to_os_string();
    produced.push(".dot");
    let produced = PathBuf::from(produced);
    if !produced.is_file() {
        bail!(
            "postgresql_autodoc finished but '{}' is missing",
            produced.display()
        );
    }
    Ok(produced)
}

/// Tables-only diagram: `<output_dir>/<db>_tables.dot`.
pub fn tables_dot(db_name: &str, output_dir: &Path) -> Result<PathBuf> {
    tables_dot_with(&Cmd::new(AUTODOC), db_name, output_dir)
}

fn tables_dot_with(program: &Cmd, db_name: &str, output_dir: &Path) -> Result<PathBuf> {
    autodoc(program, db_name, &output_dir.join(tables_root(db_name)), &[])
}

/// Everything but the final line (the graph's closing brace).
pub fn strip_closing_line(dot: &str) -> &str {
    let trimmed = dot.strip_suffix('\n').unwrap_or(dot);
    match trimmed.rfind('\n') {
        Some(idx) => &dot[..=idx],
        None => "",
    }
}

/// Append view edges to an open graph body and close it.
pub fn close_with_view_edges(body: &str, edges: &[ViewDependency]) -> String {
    let mut out = String::with_capacity(body.len() + 64 * edges.len());
    out.push_str(body);
    out.push_str(VIEW_EDGE_STYLE);
    for edge in edges {
        out.push_str(&edge.dot_edge());
    }
    out.push_str("}\n");
    out
}

/// Tables and views diagram: `<output_dir>/<db>_tables-and-views.dot`.
///
/// `dependencies` supplies the view edges once autodoc has succeeded.
pub fn tables_and_views_dot<F>(db_name: &str, output_dir: &Path, dependencies: F) -> Result<PathBuf>
where
    F: FnOnce() -> Result<Vec<ViewDependency>>,
{
    tables_and_views_dot_with(&Cmd::new(AUTODOC), db_name, output_dir, dependencies)
}

fn tables_and_views_dot_with<F>(
    program: &Cmd,
    db_name: &str,
    output_dir: &Path,
    dependencies: F,
) -> Result<PathBuf>
where
    F: FnOnce() -> Result<Vec<ViewDependency>>,
{
    let scratch = tempfile::tempdir().context("creating autodoc scratch directory")?;
    let produced = autodoc(program, db_name, &scratch.path().join("schema"), &["-l", "."])?;
    let raw = fs::read_to_string(&produced)
        .with_context(|| format!("reading '{}'", produced.display()))?;

    let edges = dependencies()?;
    tracing::debug!("{} view dependency edges", edges.len());
    let dot = close_with_view_edges(strip_closing_line(&raw), &edges);

    let path = output_dir.join(format!("{}-and-views.dot", tables_root(db_name)));
    let mut file =
        fs::File::create(&path).with_context(|| format!("creating '{}'", path.display()))?;
    file.write_all(dot.as_bytes())
        .with_context(|| format!("writing '{}'", path.display()))?;
    Ok(path)
}

fn tables_root(db_name: &str) -> String {
    format!("{db_name}_tables")
}
