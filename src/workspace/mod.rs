//! Package descriptors and the adapters that discover them
//!
//! The graph pipeline consumes a flat list of [`PackageDescriptor`] values. Two
//! adapters produce them: `cargo metadata` for cargo workspaces, and a JSON/YAML
//! descriptor file for workspaces discovered by other build tooling.

mod cargo;
mod descriptor;
mod file;

pub use descriptor::{Dependencies, DependencyKind, PackageDescriptor};

use crate::Result;
use camino::Utf8PathBuf;

const LOG_TARGET: &str = "  workspace";

/// Where to find the workspace's packages.
#[derive(Debug, Clone)]
pub struct DiscoveryOptions {
    /// Manifest of the cargo workspace, used when no descriptor file is given
    pub manifest_path: Utf8PathBuf,

    /// Descriptor file written by another discovery tool
    pub descriptors: Option<Utf8PathBuf>,

    /// Build-base directory hint, forwarded for discovery tools that need it
    pub build_base: Utf8PathBuf,
}

/// Discover every package of the workspace.
pub fn discover(options: &DiscoveryOptions) -> Result<Vec<PackageDescriptor>> {
    log::debug!(target: LOG_TARGET, "Using build base '{}'", options.build_base);

    let descriptors = if let Some(path) = &options.descriptors {
        log::info!(target: LOG_TARGET, "Loading package descriptors from '{path}'");
        file::load(path)?
    } else {
        log::info!(target: LOG_TARGET, "Querying cargo workspace '{}'", options.manifest_path);
        cargo::discover(&options.manifest_path)?
    };

    log::info!(target: LOG_TARGET, "Discovered {} package(s)", descriptors.len());
    Ok(descriptors)
}
