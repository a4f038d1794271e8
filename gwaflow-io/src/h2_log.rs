//! LDSC heritability log validation.
//!
//! `ldsc.py --h2` writes its estimate seven lines from the end of the
//! log, e.g. `Total Observed scale h2: 0.1234 (0.0123)`. A log whose
//! estimate cannot be parsed is left over from a failed run and is
//! deleted so the next invocation recomputes it.

use std::path::Path;

use tracing::warn;

use crate::error::{InputError, Result};

/// Offset from the end of the log of the line holding the estimate.
const H2_LINE_FROM_END: usize = 7;

/// State of one `.h2.log` file.
#[derive(Debug, Clone, PartialEq)]
pub enum H2Status {
    Missing,
    Valid(f64),
    /// The file was unparseable and has been removed.
    Invalidated,
}

/// Extract the h2 estimate from log contents.
pub fn parse_h2(contents: &str) -> Option<f64> {
    let lines: Vec<&str> = contents.lines().collect();
    let line = lines.len().checked_sub(H2_LINE_FROM_END).map(|i| lines[i])?;
    let cleaned = line.replace(|c: char| c == '(' || c == ')', "");
    let fields: Vec<&str> = cleaned.split_whitespace().collect();
    let token = fields.len().checked_sub(2).map(|i| fields[i])?;
    token.parse::<f64>().ok()
}

/// Check a heritability log and delete it when corrupt.
///
/// This is the one completion check allowed to modify the filesystem;
/// every deletion is logged.
pub fn validate_h2_log(path: &Path) -> Result<H2Status> {
    if !path.is_file() {
        return Ok(H2Status::Missing);
    }
    let estimate = match std::fs::read(path) {
        Ok(bytes) => parse_h2(&String::from_utf8_lossy(&bytes)),
        Err(e) => {
            warn!("{}: unreadable ({}), treating as corrupt", path.display(), e);
            None
        }
    };
    match estimate {
        Some(h2) => Ok(H2Status::Valid(h2)),
        None => {
            warn!(
                "{}: no parseable h2 estimate, deleting so it is recomputed",
                path.display()
            );
            std::fs::remove_file(path).map_err(|e| InputError::unreadable(path, e))?;
            Ok(H2Status::Invalidated)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GOOD_LOG: &str = "\
Beginning analysis at Mon Jan  1 00:00:00 2024
Reading summary statistics from hdl.sumstats ...
Total Observed scale h2: 0.1234 (0.0123)
Lambda GC: 1.0512
Mean Chi^2: 1.0821
Intercept: 1.0034 (0.0071)
Ratio: 0.0415 (0.0866)
Analysis finished at Mon Jan  1 00:01:00 2024
Total time elapsed: 1.0m:2.1s
";

    #[test]
    fn test_parse_good_log() {
        assert_eq!(parse_h2(GOOD_LOG), Some(0.1234));
    }

    #[test]
    fn test_parse_short_log() {
        assert_eq!(parse_h2("one\ntwo\n"), None);
        assert_eq!(parse_h2(""), None);
    }

    #[test]
    fn test_parse_non_numeric() {
        let log = GOOD_LOG.replace("0.1234", "NA_VALUE");
        assert_eq!(parse_h2(&log), None);
    }

    #[test]
    fn test_validate_keeps_valid_log() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hdl.h2.log");
        std::fs::write(&path, GOOD_LOG).unwrap();
        assert_eq!(validate_h2_log(&path).unwrap(), H2Status::Valid(0.1234));
        assert!(path.exists());
    }

    #[test]
    fn test_validate_deletes_corrupt_log() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hdl.h2.log");
        std::fs::write(&path, "ERROR: munge failed\n").unwrap();
        assert_eq!(validate_h2_log(&path).unwrap(), H2Status::Invalidated);
        assert!(!path.exists());
    }

    #[test]
    fn test_validate_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hdl.h2.log");
        assert_eq!(validate_h2_log(&path).unwrap(), H2Status::Missing);
    }
}
