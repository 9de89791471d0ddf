use super::Host;
use super::common::{LogLevel, init_logging};
use super::config::{Config, validate_stem};
use crate::Result;
use crate::export::{GraphFormat, export};
use crate::facts::{CodeMetrics, FileRecord, PackageMetrics, RepositoryLocator};
use crate::graph::{DependencyGraph, NodeAttributes, build_attributes};
use crate::workspace::{DiscoveryOptions, PackageDescriptor, discover};
use camino::Utf8PathBuf;
use clap::Parser;
use ohno::IntoAppError;
use std::collections::BTreeMap;
use std::io::Write;

const LOG_TARGET: &str = "   command";

/// Stem used when the current directory has no name, such as the filesystem root
const FALLBACK_STEM: &str = "graph";

#[derive(Parser, Debug)]
#[command(name = "cargo-gephi", author, version, long_about = None, display_name = "cargo-gephi")]
#[command(about = "Export the package dependency graph of a workspace for Gephi and Graphviz")]
pub struct GraphArgs {
    /// The graph file format to be generated [default: dot]
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<GraphFormat>,

    /// The base path for all build directories
    #[arg(long, default_value = "build", value_name = "DIR")]
    pub build_base: Utf8PathBuf,

    /// Path to Cargo.toml file
    #[arg(long, default_value = "Cargo.toml", value_name = "PATH")]
    pub manifest_path: Utf8PathBuf,

    /// Read package descriptors from a JSON or YAML file instead of querying cargo
    #[arg(long, value_name = "PATH")]
    pub descriptors: Option<Utf8PathBuf>,

    /// Path to configuration file (default is `gephi.toml`)
    #[arg(long, short = 'c', value_name = "PATH")]
    pub config: Option<Utf8PathBuf>,

    /// Output file name without extension (default is the current directory's name)
    #[arg(long, value_name = "STEM")]
    pub name: Option<String>,

    /// Directory to write the graph file into (default is the current directory)
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<Utf8PathBuf>,

    /// Don't count lines of code with cloc
    #[arg(long)]
    pub no_code_metrics: bool,

    /// Don't record the git checkout of each package
    #[arg(long)]
    pub no_repositories: bool,

    /// Set the logging level for diagnostic output
    #[arg(long, value_name = "LEVEL", default_value = "none")]
    pub log_level: LogLevel,
}

/// Build the dependency graph of the workspace and write it to a file
pub async fn process_graph<H: Host>(host: &mut H, args: &GraphArgs) -> Result<()> {
    init_logging(args.log_level);

    match generate_graph(host, args).await {
        Ok((format, path)) => {
            let _ = writeln!(host.output(), "Wrote {format} file to {path}");
            Ok(())
        }
        Err(e) => {
            let _ = writeln!(host.error(), "Graph generation failed: {e:#}");
            Err(e)
        }
    }
}

async fn generate_graph<H: Host>(host: &mut H, args: &GraphArgs) -> Result<(GraphFormat, Utf8PathBuf)> {
    let cwd = current_dir()?;
    let config = Config::load(&cwd, args.config.as_ref())?;

    let format = args.format.unwrap_or(config.format);
    let stem = args
        .name
        .clone()
        .or_else(|| config.name.clone())
        .unwrap_or_else(|| cwd.file_name().unwrap_or(FALLBACK_STEM).to_string());
    validate_stem(&stem)?;

    let descriptors = discover(&DiscoveryOptions {
        manifest_path: args.manifest_path.clone(),
        descriptors: args.descriptors.clone(),
        build_base: args.build_base.clone(),
    })?;

    let records = if config.code_metrics && !args.no_code_metrics {
        count_lines(host, &config, &descriptors).await?
    } else {
        log::info!(target: LOG_TARGET, "Code metrics disabled");
        None
    };

    let mut locator = if config.repositories && !args.no_repositories {
        Some(RepositoryLocator::new(&cwd, config.git_timeout))
    } else {
        log::info!(target: LOG_TARGET, "Repository lookup disabled");
        None
    };

    let mut packages: Vec<(PackageDescriptor, NodeAttributes)> = Vec::with_capacity(descriptors.len());
    for descriptor in descriptors {
        let repository = match locator.as_mut() {
            Some(locator) => locator.locate(&descriptor.path).await,
            None => None,
        };

        let metrics = records
            .as_ref()
            .map(|records| records.get(&descriptor.path).map_or_else(PackageMetrics::default, |r| PackageMetrics::summarize(r)));

        let attributes = build_attributes(&descriptor, repository.as_ref(), metrics.as_ref(), &config.dropped_attributes);
        packages.push((descriptor, attributes));
    }

    let graph = DependencyGraph::assemble(packages)?;

    let output_dir = args.output_dir.clone().unwrap_or(cwd);
    let path = export(&graph, format, &stem, &output_dir)?;

    Ok((format, path))
}

/// Run cloc over every package, or return `None` when cloc is not installed.
async fn count_lines<H: Host>(
    host: &mut H,
    config: &Config,
    descriptors: &[PackageDescriptor],
) -> Result<Option<BTreeMap<Utf8PathBuf, Vec<FileRecord>>>> {
    let Some(code_metrics) = CodeMetrics::locate(&config.cloc_program, config.cloc_timeout) else {
        let _ = writeln!(host.output(), "No cloc executable found, skipping associated node attributes");
        return Ok(None);
    };

    let _ = writeln!(host.output(), "cloc found, running...");

    let paths: Vec<Utf8PathBuf> = descriptors.iter().map(|d| d.path.clone()).collect();
    Ok(Some(code_metrics.aggregate(&paths).await?))
}

fn current_dir() -> Result<Utf8PathBuf> {
    let dir = std::env::current_dir().into_app_err("could not determine the current directory")?;
    Utf8PathBuf::from_path_buf(dir)
        .map_err(|dir| ohno::app_err!("current directory '{}' is not valid UTF-8", dir.display()))
}
