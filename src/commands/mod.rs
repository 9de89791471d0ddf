//! Command-line interface and orchestration for cargo-gephi
//!
//! This module parses the command line, loads configuration, and drives the
//! pipeline that turns a workspace into a graph file.
//!
//! # Execution Flow
//!
//! The `run` function parses command-line arguments using clap and hands the
//! `gephi` subcommand's arguments to `process_graph`, which:
//!
//! 1. Loads `gephi.toml` (or the file named by `--config`) and applies flag overrides
//! 2. Discovers package descriptors from cargo or a descriptor file
//! 3. Counts lines of code with cloc, when enabled and installed
//! 4. Looks up the git checkout of every package, when enabled
//! 5. Builds node attributes and assembles the dependency graph
//! 6. Writes the graph file and reports its path
//!
//! All output goes through a [`Host`], so the whole flow runs in tests with
//! captured streams.

mod common;
mod config;
mod graph;
mod host;
mod run;

pub use common::{LogLevel, init_logging};
pub use config::{CONFIG_FILE_NAME, Config, DEFAULT_CONFIG_TOML};
pub use graph::{GraphArgs, process_graph};
pub use host::Host;
pub use run::run;
