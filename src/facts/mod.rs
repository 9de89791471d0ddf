//! Facts gathered about packages from outside their descriptors
//!
//! Two optional enrichment sources live here: the git checkout a package belongs
//! to, and line counts produced by `cloc`. Both shell out to external tools.

mod code_metrics;
mod process;
mod repository;

pub use code_metrics::{CodeMetrics, FileRecord, PackageMetrics, parse_cloc_output, partition};
pub use repository::{ProbeError, Remote, Repository, RepositoryLocator, url_stem};
