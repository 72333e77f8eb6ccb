//! Build and test tooling for the Netmeld toolsuite.
//!
//! Three independent utilities share this crate:
//!
//! - **Dockerfile generation** - one instruction sequence per packaging module
//! - **Datastore graphics** - process flow graph and schema diagrams rendered
//!   with Graphviz
//! - **Smoke tests** - run installed tools and check their exit codes
//!
//! # Architecture
//!
//! ```text
//! docker-netmeld ─────────> dockerfile (pure; text on stdout)
//!
//! nmdb-schema-graphics ───> graphics ──┬─> preflight
//!                                      ├─> process::Cmd (nmdb-initialize,
//!                                      │     postgresql_autodoc, dot)
//!                                      └─> catalog query (sqlx)
//!
//! netmeld-smoke-test ─────> smoke ─────┬─> profile (built-in or TOML)
//!                                      └─> process::Cmd (tools under test)
//! ```
//!
//! # Example
//!
//! ```rust
//! use netmeld_devtools::dockerfile::{generate, render, GenerateOptions, Module};
//!
//! let dockerfile = render(&generate(Module::Datalake, GenerateOptions { stay_root: true }));
//! assert!(dockerfile.starts_with("FROM debian:testing-slim\n"));
//! assert!(!dockerfile.contains("USER netmeld"));
//! ```

pub mod dockerfile;
pub mod graphics;
pub mod logging;
pub mod preflight;
pub mod process;
pub mod smoke;

pub use dockerfile::{GenerateOptions, Instruction, Module};
pub use graphics::GraphicsConfig;
pub use smoke::{CommandSpec, Profile, RunReport};
