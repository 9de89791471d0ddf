//! Graph file writers
//!
//! Three writers serialize a [`DependencyGraph`] for visualization tools such as
//! Gephi:
//! - **DOT**: Graphviz `digraph` with quoted identifiers
//! - **GML**: the Graph Modelling Language, in the dialect networkx and Gephi read
//! - **GEXF**: Gephi's native XML format, version 1.2draft
//!
//! Each writer is a `generate` function over a [`core::fmt::Write`] sink, so output
//! can be checked in memory. [`export`] picks the writer and puts the result on disk.

mod dot;
mod gexf;
mod gml;

pub use gexf::{AttributeDecl, AttributeType, Declarations, promote_list_attributes};

use crate::Result;
use crate::graph::DependencyGraph;
use camino::{Utf8Path, Utf8PathBuf};
use chrono::{Local, NaiveDate};
use clap::ValueEnum;
use ohno::IntoAppError;
use serde::{Deserialize, Serialize};
use std::fs;
use strum::{Display, EnumIter, EnumString};

const LOG_TARGET: &str = "    export";

/// Supported graph file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Deserialize, Serialize, Display, EnumString, EnumIter)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum GraphFormat {
    /// Graphviz DOT
    #[default]
    Dot,

    /// Graph Modelling Language
    Gml,

    /// Graph Exchange XML Format
    Gexf,
}

impl GraphFormat {
    /// File extension of the format, without the leading dot.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Dot => "dot",
            Self::Gml => "gml",
            Self::Gexf => "gexf",
        }
    }
}

/// Serialize `graph` into a string in the requested format.
pub fn render(graph: &DependencyGraph, format: GraphFormat, name: &str, modified: NaiveDate) -> Result<String> {
    let mut out = String::new();
    match format {
        GraphFormat::Dot => dot::generate(graph, name, &mut out)?,
        GraphFormat::Gml => gml::generate(graph, name, &mut out)?,
        GraphFormat::Gexf => gexf::generate(graph, name, modified, &mut out)?,
    }
    Ok(out)
}

/// Write `graph` to `<dir>/<stem>.<extension>` and return the written path.
pub fn export(graph: &DependencyGraph, format: GraphFormat, stem: &str, dir: &Utf8Path) -> Result<Utf8PathBuf> {
    let path = dir.join(format!("{stem}.{}", format.extension()));
    let contents = render(graph, format, stem, Local::now().date_naive())?;

    fs::create_dir_all(dir).into_app_err_with(|| format!("could not create output directory '{dir}'"))?;
    fs::write(&path, contents).into_app_err_with(|| format!("could not write graph file '{path}'"))?;

    log::info!(target: LOG_TARGET, "Wrote {} node(s) and {} edge(s) to '{path}'", graph.node_count(), graph.edge_count());
    Ok(path)
}
