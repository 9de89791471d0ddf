#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Core library for cargo-gephi
//!
//! This crate is an implementation detail of the `cargo-gephi` tool. This crate's API is fluid and may change without
//! warning and in a semver-incompatible way.
//!
//! # Module Organization
//!
//! - [`commands`]: Command-line interface and orchestration
//! - [`workspace`]: Package descriptors and the adapters that discover them
//! - [`facts`]: Optional node enrichment from git checkouts and `cloc`
//! - [`graph`]: Node attributes and the dependency graph
//! - [`export`]: DOT, GML, and GEXF writers

/// Result type alias using `ohno::AppError` as the default error type.
pub type Result<T, E = ohno::AppError> = core::result::Result<T, E>;

#[doc(hidden)]
pub mod commands;

#[doc(hidden)]
pub mod export;

#[doc(hidden)]
pub mod facts;

#[doc(hidden)]
pub mod graph;

#[doc(hidden)]
pub mod workspace;

pub use crate::commands::{Host, run};
