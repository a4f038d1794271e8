//! GWA list files.
//!
//! Whitespace-separated, no header; the first column is a path to a
//! summary-statistics file, later columns (sample size, ...) are ignored
//! here:
//! ```text
//! /data/gwa/scz.txt   130644
//! /data/gwa/bip.txt   413466
//! ```

use std::path::{Path, PathBuf};

use crate::error::{InputError, Result};

/// One entry of a GWA list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GwaListEntry {
    pub path: PathBuf,
    /// Basename with any `.txt` extension removed.
    pub prefix: String,
}

pub fn parse_gwa_list<P: AsRef<Path>>(path: P) -> Result<Vec<GwaListEntry>> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path).map_err(|e| InputError::unreadable(path, e))?;

    let mut entries = Vec::new();
    for (idx, line) in contents.lines().enumerate() {
        let first = match line.split_whitespace().next() {
            Some(f) => f,
            None => continue,
        };
        let basename = first.rsplit('/').next().unwrap_or(first);
        let prefix = basename.strip_suffix(".txt").unwrap_or(basename);
        if prefix.is_empty() {
            return Err(InputError::Malformed {
                path: path.to_path_buf(),
                line: idx + 1,
                message: format!("cannot derive a phenotype name from '{}'", first),
            });
        }
        entries.push(GwaListEntry {
            path: PathBuf::from(first),
            prefix: prefix.to_string(),
        });
    }
    Ok(entries)
}
