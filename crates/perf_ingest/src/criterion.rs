//! Criterion result discovery and `estimates.json` parsing.

use crate::payload::BenchRecord;
use glob::MatchOptions;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

pub const ESTIMATES_FILE: &str = "estimates.json";
const NEW_DIR: &str = "new";

#[derive(Error, Debug)]
pub enum CriterionError {
    #[error("read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("glob: {0}")]
    Pattern(#[from] glob::PatternError),
    #[error("glob: {0}")]
    Glob(#[from] glob::GlobError),
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
pub struct PointEstimate {
    pub point_estimate: f64,
}

/// The statistics we forward from Criterion's `estimates.json`.
///
/// Other keys (`std_dev`, `median_abs_dev`, ...) are ignored; a `null` value counts as absent.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Estimates {
    #[serde(default)]
    pub mean: Option<PointEstimate>,
    #[serde(default)]
    pub median: Option<PointEstimate>,
    #[serde(default)]
    pub slope: Option<PointEstimate>,
}

/// A `<bench>/new` directory found under the Criterion root.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResultDir {
    pub bench: String,
    pub path: PathBuf,
}

impl ResultDir {
    pub fn estimates_path(&self) -> PathBuf {
        self.path.join(ESTIMATES_FILE)
    }
}

/// Find every `<criterion_dir>/*/new` directory, in glob order.
pub fn discover(criterion_dir: &Path) -> Result<Vec<ResultDir>, CriterionError> {
    let pattern = result_pattern(criterion_dir);
    let options = MatchOptions {
        require_literal_leading_dot: true,
        ..Default::default()
    };
    let mut dirs = Vec::new();
    for entry in glob::glob_with(&pattern, options)? {
        let path = entry?;
        if !path.is_dir() {
            continue;
        }
        let Some(bench) = bench_name(&path) else {
            continue;
        };
        dirs.push(ResultDir { bench, path });
    }
    info!(root = %criterion_dir.display(), count = dirs.len(), "discovered result dirs");
    Ok(dirs)
}

/// `<root>/*/new` with the root escaped. An empty root means the current directory.
fn result_pattern(criterion_dir: &Path) -> String {
    let raw = criterion_dir.to_string_lossy();
    if raw.is_empty() {
        return format!("*/{}", NEW_DIR);
    }
    let root = glob::Pattern::escape(&raw);
    if root.ends_with('/') {
        format!("{}*/{}", root, NEW_DIR)
    } else {
        format!("{}/*/{}", root, NEW_DIR)
    }
}

/// Name of the directory holding `new`, i.e. the benchmark's directory.
fn bench_name(new_dir: &Path) -> Option<String> {
    new_dir
        .parent()
        .and_then(|p| p.file_name())
        .map(|n| n.to_string_lossy().into_owned())
}

/// Read and parse `<dir>/estimates.json`.
pub fn read_estimates(dir: &ResultDir) -> Result<Estimates, CriterionError> {
    let path = dir.estimates_path();
    let content = std::fs::read_to_string(&path).map_err(|source| CriterionError::Io {
        path: path.clone(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| CriterionError::Parse { path, source })
}

/// Discover and extract one record per result dir. Stops at the first unreadable file.
pub fn collect(criterion_dir: &Path) -> Result<Vec<BenchRecord>, CriterionError> {
    let dirs = discover(criterion_dir)?;
    let mut records = Vec::with_capacity(dirs.len());
    for dir in &dirs {
        let estimates = read_estimates(dir)?;
        let record = BenchRecord::from_estimates(dir.bench.clone(), &estimates);
        debug!(bench = %record.bench, mean = ?record.mean, median = ?record.median, slope = ?record.slope, "extracted");
        records.push(record);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_result(root: &Path, bench: &str, json: &str) {
        let dir = root.join(bench).join("new");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(ESTIMATES_FILE), json).unwrap();
    }

    #[test]
    fn estimates_ignore_extra_keys() {
        let json = r#"{
            "mean": {"confidence_interval": {"confidence_level": 0.95, "lower_bound": 1.0, "upper_bound": 2.0}, "point_estimate": 1.5, "standard_error": 0.1},
            "median_abs_dev": {"point_estimate": 0.2},
            "std_dev": {"point_estimate": 0.3}
        }"#;
        let e: Estimates = serde_json::from_str(json).unwrap();
        assert_eq!(e.mean, Some(PointEstimate { point_estimate: 1.5 }));
        assert_eq!(e.median, None);
        assert_eq!(e.slope, None);
    }

    #[test]
    fn null_slope_is_absent() {
        let e: Estimates =
            serde_json::from_str(r#"{"mean":{"point_estimate":3.0},"slope":null}"#).unwrap();
        assert_eq!(e.slope, None);
    }

    #[test]
    fn discover_only_new_dirs() {
        let tmp = TempDir::new().unwrap();
        write_result(tmp.path(), "alpha", "{}");
        write_result(tmp.path(), "beta", "{}");
        std::fs::create_dir_all(tmp.path().join("gamma").join("base")).unwrap();
        std::fs::create_dir_all(tmp.path().join("report")).unwrap();
        let dirs = discover(tmp.path()).unwrap();
        let names: Vec<_> = dirs.iter().map(|d| d.bench.as_str()).collect();
        assert_eq!(names, vec!["alpha", "beta"]);
    }

    #[test]
    fn discover_skips_hidden_dirs() {
        let tmp = TempDir::new().unwrap();
        write_result(tmp.path(), "visible", "{}");
        write_result(tmp.path(), ".hidden", "{}");
        let dirs = discover(tmp.path()).unwrap();
        let names: Vec<_> = dirs.iter().map(|d| d.bench.as_str()).collect();
        assert_eq!(names, vec!["visible"]);
    }

    #[test]
    fn pattern_for_empty_root_is_relative() {
        assert_eq!(result_pattern(Path::new("")), "*/new");
        assert_eq!(result_pattern(Path::new("/")), "/*/new");
        assert_eq!(result_pattern(Path::new("target/criterion/")), "target/criterion/*/new");
        assert_eq!(result_pattern(Path::new("target/criterion")), "target/criterion/*/new");
        assert_eq!(result_pattern(Path::new("crit[1]")), "crit[[]1[]]/*/new");
    }

    #[test]
    fn discover_missing_root_is_empty() {
        let tmp = TempDir::new().unwrap();
        let dirs = discover(&tmp.path().join("nope")).unwrap();
        assert!(dirs.is_empty());
    }

    #[test]
    fn discover_escapes_root() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("crit[1]");
        write_result(&root, "escaped", "{}");
        let dirs = discover(&root).unwrap();
        assert_eq!(dirs.len(), 1);
        assert_eq!(dirs[0].bench, "escaped");
    }

    #[test]
    fn collect_missing_file_fails() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir_all(tmp.path().join("empty").join("new")).unwrap();
        let err = collect(tmp.path()).unwrap_err();
        assert!(matches!(err, CriterionError::Io { .. }));
    }

    #[test]
    fn collect_malformed_fails() {
        let tmp = TempDir::new().unwrap();
        write_result(tmp.path(), "ok", r#"{"mean":{"point_estimate":1.0}}"#);
        write_result(tmp.path(), "broken", "{ not json");
        let err = collect(tmp.path()).unwrap_err();
        assert!(matches!(err, CriterionError::Parse { .. }));
    }
}
