use super::{DependencyKind, PackageDescriptor};
use crate::Result;
use camino::Utf8Path;
use cargo_metadata::{DependencyKind as CargoDependencyKind, MetadataCommand, Package};
use ohno::IntoAppError;
use serde_json::{Value, json};

/// Build type tag given to every package discovered through `cargo metadata`.
pub const CARGO_BUILD_TYPE: &str = "cargo";

/// Describe every member of the cargo workspace owning `manifest_path`.
pub fn discover(manifest_path: &Utf8Path) -> Result<Vec<PackageDescriptor>> {
    let mut metadata_cmd = MetadataCommand::new();
    let _ = metadata_cmd.manifest_path(manifest_path).no_deps();

    let metadata = metadata_cmd.exec().into_app_err("retrieving workspace metadata")?;

    Ok(metadata.workspace_packages().into_iter().map(describe_package).collect())
}

#[expect(unused_results, reason = "Map::insert intentionally overwrites values")]
fn describe_package(package: &Package) -> PackageDescriptor {
    let path = package
        .manifest_path
        .parent()
        .map_or_else(|| package.manifest_path.clone(), Utf8Path::to_path_buf);

    let mut descriptor = PackageDescriptor::new(package.name.to_string(), path, CARGO_BUILD_TYPE);

    // Free-form `[package.metadata]` tables go in first so the manifest fields below win on collisions
    if let Value::Object(extra) = &package.metadata {
        descriptor.metadata.extend(extra.iter().map(|(k, v)| (k.clone(), v.clone())));
    }

    let metadata = &mut descriptor.metadata;
    metadata.insert("version".to_string(), json!(package.version.to_string()));
    metadata.insert("edition".to_string(), serde_json::to_value(&package.edition).unwrap_or(Value::Null));
    metadata.insert("maintainers".to_string(), json!(package.authors));
    metadata.insert("keywords".to_string(), json!(package.keywords));
    metadata.insert("categories".to_string(), json!(package.categories));

    if let Some(description) = &package.description {
        metadata.insert("description".to_string(), json!(description));
    }

    if let Some(license) = &package.license {
        metadata.insert("license".to_string(), json!(license));
    }

    if let Some(repository) = &package.repository {
        metadata.insert("repository".to_string(), json!(repository));
    }

    for dep in &package.dependencies {
        let kind = match dep.kind {
            CargoDependencyKind::Build => DependencyKind::Build,
            CargoDependencyKind::Development => DependencyKind::Test,
            _ => DependencyKind::Run,
        };

        let _ = descriptor.dependencies.insert(kind, dep.name.to_string());
    }

    descriptor
}
