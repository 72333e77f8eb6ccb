//! Datastore diagrams: process flow graph and schema graphs.
//!
//! A run is a single forward pass:
//!
//! ```text
//! preflight ─> flow listing ─> netmeld-datastore.dot
//!          └─> nmdb-initialize ─> postgresql_autodoc ─> <db>_tables.dot
//!                              └─> postgresql_autodoc + catalog query
//!                                   ─> <db>_tables-and-views.dot
//! every .dot ─> dot -T{pdf,png,svg}
//! ```
//!
//! Everything up to rendering aborts on the first error. Rendering tries
//! every file and format and reports the failures together.

pub mod catalog;
pub mod flow;
pub mod render;
pub mod schema;
pub mod template;

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::PathBuf;

pub use render::RenderFailure;

/// Inputs for a diagram run.
#[derive(Debug, Clone)]
pub struct GraphicsConfig {
    pub db_name: String,
    pub db_namespace: String,
    pub schema_dir: PathBuf,
    /// Root of the datastore source tree (tool directories and `common/`).
    pub source_root: PathBuf,
    /// Flow template; the bundled one when `None`.
    pub template: Option<PathBuf>,
    pub output_dir: PathBuf,
}

impl Default for GraphicsConfig {
    fn default() -> Self {
        Self {
            db_name: "site".to_string(),
            db_namespace: "public".to_string(),
            schema_dir: PathBuf::from("../common/schemas/"),
            source_root: PathBuf::from(".."),
            template: None,
            output_dir: PathBuf::from("."),
        }
    }
}

/// What a run produced.
#[derive(Debug)]
pub struct GraphicsReport {
    pub dot_files: Vec<PathBuf>,
    pub render_failures: Vec<RenderFailure>,
}

impl GraphicsReport {
    pub fn success(&self) -> bool {
        self.render_failures.is_empty()
    }
}

fn load_template(config: &GraphicsConfig) -> Result<String> {
    match &config.template {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("reading flow template '{}'", path.display())),
        None => Ok(flow::DEFAULT_TEMPLATE.to_string()),
    }
}

pub fn generate_flow(config: &GraphicsConfig) -> Result<PathBuf> {
    println!("- Generating Datastore flow graph");
    let template = load_template(config)?;
    flow::generate_flow_dot(&config.source_root, &template, &config.output_dir)
}

pub fn generate_schema(config: &GraphicsConfig) -> Result<Vec<PathBuf>> {
    if !config.schema_dir.is_dir() {
        bail!(
            "schema directory '{}' does not exist",
            config.schema_dir.display()
        );
    }

    println!("- (Re-)Initializing DB to just contain Netmeld Datastore schema");
    schema::reset_database(&config.db_name, &config.schema_dir)?;

    println!("- Generating default graph (just tables)");
    let tables = schema::tables_dot(&config.db_name, &config.output_dir)?;

    println!("- Generating modified graph (tables+views)");
    let tables_and_views = schema::tables_and_views_dot(&config.db_name, &config.output_dir, || {
        catalog::view_dependencies(&config.db_name, &config.db_namespace)
    })?;

    Ok(vec![tables, tables_and_views])
}

/// Full run: preflight, every `.dot` file, then every rendering.
pub fn generate_all(config: &GraphicsConfig) -> Result<GraphicsReport> {
    crate::preflight::check_graphics_tools()?;
    fs::create_dir_all(&config.output_dir).with_context(|| {
        format!(
            "creating output directory '{}'",
            config.output_dir.display()
        )
    })?;

    println!(
        "Running for DB-NS: {}-{}",
        config.db_name, config.db_namespace
    );
    println!("Generating dot file(s)");
    let mut dot_files = vec![generate_flow(config)?];
    dot_files.extend(generate_schema(config)?);

    println!("Generating graph graphics in various formats");
    let render_failures = render::render_all(&dot_files);

    Ok(GraphicsReport {
        dot_files,
        render_failures,
    })
}
