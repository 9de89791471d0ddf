use super::NodeAttributes;
use crate::Result;
use crate::workspace::{DependencyKind, PackageDescriptor};
use ohno::bail;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use std::collections::{HashMap, HashSet};
use strum::IntoEnumIterator;

const LOG_TARGET: &str = "     graph";

/// A package as it appears in the graph.
#[derive(Debug, Clone, PartialEq)]
pub struct PackageNode {
    pub name: String,
    pub attributes: NodeAttributes,
}

/// A dependency edge, with endpoints given as node positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DependencyEdge {
    pub source: usize,
    pub target: usize,
    pub kind: DependencyKind,
}

/// Packages of a workspace and the dependencies between them.
///
/// Nodes keep the order of the input descriptors and edges the order in which
/// they were discovered, so every export of the same input is identical.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    graph: DiGraph<PackageNode, DependencyKind>,
}

impl DependencyGraph {
    /// Build the graph of `packages`, each paired with its node attributes.
    ///
    /// Dependencies on names that are not workspace packages produce no edge.
    pub fn assemble(packages: Vec<(PackageDescriptor, NodeAttributes)>) -> Result<Self> {
        let mut graph = DiGraph::with_capacity(packages.len(), 0);
        let mut indices: HashMap<String, NodeIndex> = HashMap::with_capacity(packages.len());
        let mut dependencies = Vec::with_capacity(packages.len());

        for (descriptor, attributes) in packages {
            if indices.contains_key(&descriptor.name) {
                bail!("package '{}' is declared more than once", descriptor.name);
            }

            let index = graph.add_node(PackageNode {
                name: descriptor.name.clone(),
                attributes,
            });
            let _ = indices.insert(descriptor.name, index);
            dependencies.push((index, descriptor.dependencies));
        }

        for (source, deps) in &dependencies {
            for kind in DependencyKind::iter() {
                for name in deps.of_kind(kind) {
                    match indices.get(name) {
                        Some(&target) => {
                            let _ = graph.add_edge(*source, target, kind);
                        }
                        None => log::trace!(target: LOG_TARGET, "Skipping {kind} dependency on external package '{name}'"),
                    }
                }
            }
        }

        log::info!(target: LOG_TARGET, "Assembled graph with {} node(s) and {} edge(s)", graph.node_count(), graph.edge_count());
        Ok(Self { graph })
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &PackageNode> {
        self.graph.node_weights()
    }

    /// The node at position `index`, as reported by [`DependencyEdge`].
    #[must_use]
    pub fn node(&self, index: usize) -> Option<&PackageNode> {
        self.graph.node_weight(NodeIndex::new(index))
    }

    /// Edges in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = DependencyEdge> + '_ {
        self.graph.edge_references().map(|edge| DependencyEdge {
            source: edge.source().index(),
            target: edge.target().index(),
            kind: *edge.weight(),
        })
    }

    /// Whether some pair of nodes is connected by more than one edge.
    #[must_use]
    pub fn has_parallel_edges(&self) -> bool {
        let mut seen = HashSet::new();
        self.edges().any(|edge| !seen.insert((edge.source, edge.target)))
    }
}
