//! Completion checks.
//!
//! An item is complete only when every one of its expected outputs
//! exists. Checking never touches the filesystem beyond `stat`.

use std::path::{Path, PathBuf};

/// Output paths that must all exist for a work item to count as done.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpectedOutputs {
    paths: Vec<PathBuf>,
}

impl ExpectedOutputs {
    pub fn new<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            paths: paths.into_iter().map(Into::into).collect(),
        }
    }

    /// One output per suffix, all sharing `prefix`.
    ///
    /// `with_suffixes("/o/hdl", &[".sumstats", ".h2.log"])` expects
    /// `/o/hdl.sumstats` and `/o/hdl.h2.log`.
    pub fn with_suffixes(prefix: &Path, suffixes: &[&str]) -> Self {
        let base = prefix.as_os_str();
        Self {
            paths: suffixes
                .iter()
                .map(|s| {
                    let mut p = base.to_os_string();
                    p.push(s);
                    PathBuf::from(p)
                })
                .collect(),
        }
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Expected outputs that do not exist yet.
    pub fn missing(&self) -> Vec<&Path> {
        self.paths
            .iter()
            .filter(|p| !p.is_file())
            .map(PathBuf::as_path)
            .collect()
    }
}

/// Whether a work item can be skipped.
///
/// Always `false` under `force`. An empty expectation set is never
/// complete: a stage with nothing to check always runs.
pub fn is_complete(expected: &ExpectedOutputs, force: bool) -> bool {
    if force || expected.paths.is_empty() {
        return false;
    }
    expected.paths.iter().all(|p| p.is_file())
}
