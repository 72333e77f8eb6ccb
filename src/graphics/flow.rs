//! Datastore process flow graph: which tools and library headers exist.
//!
//! Names are gathered from the source tree, wrapped as Graphviz HTML-label
//! table rows and substituted into the flow template.

use anyhow::{Context, Result};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::template::substitute;

/// Directories (relative to the source root) holding `nmdb-*` tools.
/// The empty entry is the source root itself.
pub const BIN_DIRS: &[&str] = &["", "exporters", "graphers", "importers", "inserters"];

/// Directories (relative to `<source root>/common`) holding library headers.
pub const LIB_DIRS: &[&str] = &["objects", "parsers", "tools", "utils"];

pub const FLOW_DOT_FILENAME: &str = "netmeld-datastore.dot";

pub const DEFAULT_TEMPLATE: &str = include_str!("../../templates/datastore.dot.tmpl");

/// Row names that get a port anchor so edges can attach to them.
const PORTS: &[(&str, &str)] = &[
    ("nmdb-initialize", "init"),
    ("nmdb-remove-tool-run", "remove"),
    ("AbstractDatastoreTool", "dstool"),
];

/// Tool names directly under `dir`: entries matching `nmdb-*`
/// (case-insensitive) with `ext` removed.
pub fn list_bins(dir: &Path, ext: &str) -> Result<Vec<String>> {
    if !dir.is_dir() {
        tracing::warn!("tool directory '{}' not found", dir.display());
        return Ok(Vec::new());
    }

    let mut names = BTreeSet::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.with_context(|| format!("listing '{}'", dir.display()))?;
        let name = entry.file_name().to_string_lossy();
        if name.to_ascii_lowercase().starts_with("nmdb-") {
            names.insert(name.replace(ext, ""));
        }
    }
    Ok(names.into_iter().collect())
}

/// Header paths under `dir` (recursive, relative to `dir`) ending in `ext`
/// (case-insensitive), with `ext` removed.
pub fn list_libs(dir: &Path, ext: &str) -> Result<Vec<String>> {
    if !dir.is_dir() {
        tracing::warn!("library directory '{}' not found", dir.display());
        return Ok(Vec::new());
    }

    let ext_lower = ext.to_ascii_lowercase();
    let mut names = BTreeSet::new();
    for entry in WalkDir::new(dir).min_depth(1) {
        let entry = entry.with_context(|| format!("listing '{}'", dir.display()))?;
        let name = entry.file_name().to_string_lossy();
        if !name.to_ascii_lowercase().ends_with(&ext_lower) {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(dir)
            .with_context(|| format!("relativizing '{}'", entry.path().display()))?;
        names.insert(relative.to_string_lossy().replace(ext, ""));
    }
    Ok(names.into_iter().collect())
}

pub fn table_row(name: &str) -> String {
    format!("<tr><td align=\"left\">{name}</td></tr>")
}

fn port_row(name: &str, port: &str) -> String {
    format!("<tr><td align=\"left\" port=\"{port}\">{name}</td></tr>")
}

/// Render sorted names as table rows, anchoring the known port rows.
pub fn rows(names: &[String]) -> Vec<String> {
    names
        .iter()
        .map(|name| match PORTS.iter().find(|(n, _)| n == name) {
            Some((_, port)) => port_row(name, port),
            None => table_row(name),
        })
        .collect()
}

/// Template values for one listing: `<prefix>_<dir>_list` and
/// `<prefix>_<dir>_count` (row count plus one, for the title row).
fn insert_listing(
    values: &mut BTreeMap<String, String>,
    prefix: &str,
    dir: &str,
    names: &[String],
) {
    let rows = rows(names);
    values.insert(format!("{prefix}_{dir}_count"), (rows.len() + 1).to_string());
    values.insert(format!("{prefix}_{dir}_list"), rows.join("\n"));
}

/// Collect every listing the flow template refers to.
pub fn collect_values(source_root: &Path) -> Result<BTreeMap<String, String>> {
    let mut values = BTreeMap::new();

    for dir in BIN_DIRS {
        let names = list_bins(&source_root.join(dir), ".cpp")?;
        tracing::debug!("{} tools under '{}'", names.len(), dir);
        insert_listing(&mut values, "ds_bins", dir, &names);
    }

    let common = source_root.join("common");
    for dir in LIB_DIRS {
        let names = list_libs(&common.join(dir), ".hpp")?;
        tracing::debug!("{} headers under 'common/{}'", names.len(), dir);
        insert_listing(&mut values, "ds_libs", dir, &names);
    }

    Ok(values)
}

/// Write the flow graph into `output_dir`, returning the `.dot` path.
pub fn generate_flow_dot(
    source_root: &Path,
    template: &str,
    output_dir: &Path,
) -> Result<PathBuf> {
    let values = collect_values(source_root)?;
    let dot = substitute(template, &values).context("filling datastore flow template")?;

    let path = output_dir.join(FLOW_DOT_FILENAME);
    fs::write(&path, dot).with_context(|| format!("writing '{}'", path.display()))?;
    Ok(path)
}
