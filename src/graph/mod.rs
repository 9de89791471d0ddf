//! Node attributes and the package dependency graph

mod assembler;
mod attributes;

pub use assembler::{DependencyEdge, DependencyGraph, PackageNode};
pub use attributes::{AttributeValue, DEFAULT_DROPPED_ATTRIBUTES, NodeAttributes, build_attributes, normalize};
