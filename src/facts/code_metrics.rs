//! Per-package line counts gathered from a single `cloc` run.

use super::process::{check_output, find_executable, run_with_timeout};
use crate::Result;
use camino::{Utf8Path, Utf8PathBuf};
use core::time::Duration;
use ohno::IntoAppError;
use serde::Deserialize;
use std::collections::BTreeMap;

const LOG_TARGET: &str = "  code_metrics";

/// Keys of the cloc report that summarize rather than describe a file.
const SUMMARY_KEYS: [&str; 2] = ["header", "SUM"];

/// Line counts for one source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    pub file: String,
    pub language: String,
    pub blank: u64,
    pub comment: u64,
    pub code: u64,
}

#[derive(Debug, Deserialize)]
struct ClocEntry {
    #[serde(default)]
    language: String,
    #[serde(default)]
    blank: u64,
    #[serde(default)]
    comment: u64,
    #[serde(default)]
    code: u64,
}

/// Totals derived from a package's file records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PackageMetrics {
    pub lines_of_code: u64,
    pub lines_of_comments: u64,
    pub number_of_files: u64,
}

impl PackageMetrics {
    #[must_use]
    pub fn summarize(records: &[FileRecord]) -> Self {
        records.iter().fold(Self::default(), |acc, record| Self {
            lines_of_code: acc.lines_of_code + record.code,
            lines_of_comments: acc.lines_of_comments + record.comment,
            number_of_files: acc.number_of_files + 1,
        })
    }
}

/// A usable line counter.
#[derive(Debug, Clone)]
pub struct CodeMetrics {
    program: Utf8PathBuf,
    timeout: Duration,
}

impl CodeMetrics {
    /// Look up the line counter, returning `None` when it is not installed.
    #[must_use]
    pub fn locate(program: &str, timeout: Duration) -> Option<Self> {
        let program = find_executable(program)?;
        log::debug!(target: LOG_TARGET, "Using line counter '{program}'");
        Some(Self { program, timeout })
    }

    #[must_use]
    pub fn program(&self) -> &Utf8Path {
        &self.program
    }

    /// Count lines in every package directory with one invocation and group the results by package.
    ///
    /// Every path in `paths` has an entry in the result, possibly empty.
    pub async fn aggregate(&self, paths: &[Utf8PathBuf]) -> Result<BTreeMap<Utf8PathBuf, Vec<FileRecord>>> {
        if paths.is_empty() {
            return Ok(BTreeMap::new());
        }

        let mut args = vec!["--json", "--by-file"];
        args.extend(paths.iter().map(|path| path.as_str()));

        let start_time = std::time::Instant::now();
        let output = run_with_timeout(&self.program, &args, self.timeout).await?;
        check_output(&output, "cloc")?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let records = parse_cloc_output(&stdout)?;

        log::debug!(
            target: LOG_TARGET,
            "Counted lines in {} file(s) across {} package(s) in {:.3}s",
            records.len(),
            paths.len(),
            start_time.elapsed().as_secs_f64()
        );

        Ok(partition(paths, records))
    }
}

/// Parse the `--json --by-file` report of cloc into file records.
///
/// Empty output means cloc found nothing to count.
pub fn parse_cloc_output(stdout: &str) -> Result<Vec<FileRecord>> {
    if stdout.trim().is_empty() {
        return Ok(Vec::new());
    }

    let report: BTreeMap<String, serde_json::Value> = serde_json::from_str(stdout).into_app_err("malformed cloc output")?;

    report
        .into_iter()
        .filter(|(key, _)| !SUMMARY_KEYS.contains(&key.as_str()))
        .map(|(file, value)| {
            let entry: ClocEntry = serde_json::from_value(value).into_app_err_with(|| format!("malformed cloc entry for '{file}'"))?;
            Ok(FileRecord {
                file,
                language: entry.language,
                blank: entry.blank,
                comment: entry.comment,
                code: entry.code,
            })
        })
        .collect()
}

/// Assign each record to the most specific package path containing it.
#[must_use]
pub fn partition(paths: &[Utf8PathBuf], records: Vec<FileRecord>) -> BTreeMap<Utf8PathBuf, Vec<FileRecord>> {
    let mut result: BTreeMap<Utf8PathBuf, Vec<FileRecord>> = paths.iter().map(|p| (p.clone(), Vec::new())).collect();

    for record in records {
        let owner = paths
            .iter()
            .filter(|path| contains(path.as_str(), &record.file))
            .max_by_key(|path| path.as_str().len());

        match owner {
            Some(path) => result.entry(path.clone()).or_default().push(record),
            None => log::debug!(target: LOG_TARGET, "File '{}' is outside every package, ignoring it", record.file),
        }
    }

    result
}

fn contains(package: &str, file: &str) -> bool {
    let package = package.trim_end_matches(['/', '\\']);
    file.strip_prefix(package)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with(['/', '\\']))
}
