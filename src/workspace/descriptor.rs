use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use strum::{Display, EnumIter, EnumString};

/// Why one package depends on another.
///
/// The declaration order is the order in which edges are emitted for a package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize, Display, EnumString, EnumIter)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DependencyKind {
    /// Needed to build the package
    Build,

    /// Needed when the package runs
    Run,

    /// Needed only to test the package
    Test,
}

/// Declared dependency names of a package, grouped by kind.
///
/// Names may refer to packages outside the workspace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Dependencies {
    #[serde(default)]
    pub build: BTreeSet<String>,

    #[serde(default)]
    pub run: BTreeSet<String>,

    #[serde(default)]
    pub test: BTreeSet<String>,
}

impl Dependencies {
    #[must_use]
    pub const fn of_kind(&self, kind: DependencyKind) -> &BTreeSet<String> {
        match kind {
            DependencyKind::Build => &self.build,
            DependencyKind::Run => &self.run,
            DependencyKind::Test => &self.test,
        }
    }

    /// Record a dependency, returning `false` if it was already declared with this kind.
    pub fn insert(&mut self, kind: DependencyKind, name: impl Into<String>) -> bool {
        let set = match kind {
            DependencyKind::Build => &mut self.build,
            DependencyKind::Run => &mut self.run,
            DependencyKind::Test => &mut self.test,
        };

        set.insert(name.into())
    }
}

/// Identity, location, type, metadata, and dependencies of one workspace package.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PackageDescriptor {
    pub name: String,

    pub path: Utf8PathBuf,

    #[serde(rename = "type")]
    pub build_type: String,

    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,

    #[serde(default)]
    pub dependencies: Dependencies,
}

impl PackageDescriptor {
    #[must_use]
    pub fn new(name: impl Into<String>, path: impl Into<Utf8PathBuf>, build_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            build_type: build_type.into(),
            metadata: serde_json::Map::new(),
            dependencies: Dependencies::default(),
        }
    }
}
