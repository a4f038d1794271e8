//! Individual-level phenotype tables.
//!
//! Whitespace-delimited files with `FID` and `IID` columns followed by any
//! number of numeric phenotype columns. Missing values become NaN.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::discovery::list_dir;
use crate::error::{InputError, Result};
use crate::pattern::glob_match;
use crate::sample::SampleKey;

/// One phenotype file, stored column-major.
#[derive(Debug, Clone)]
pub struct PhenotypeTable {
    /// File stem, used as the table's label in reports.
    pub name: String,
    /// (FID, IID) per row, in file order.
    pub samples: Vec<SampleKey>,
    /// Phenotype column names (everything except FID/IID).
    pub columns: Vec<String>,
    /// `values[j][i]` = sample i, column j.
    pub values: Vec<Vec<f64>>,
}

impl PhenotypeTable {
    pub fn n_samples(&self) -> usize {
        self.samples.len()
    }

    /// Drop columns with more than `max_missing` (a fraction) of NaN
    /// values. Returns the names dropped.
    pub fn drop_sparse_columns(&mut self, max_missing: f64) -> Vec<String> {
        let limit = max_missing * self.n_samples() as f64;
        let mut dropped = Vec::new();
        let mut keep_cols = Vec::new();
        let mut keep_vals = Vec::new();
        for (name, col) in self.columns.drain(..).zip(self.values.drain(..)) {
            let n_missing = col.iter().filter(|v| v.is_nan()).count();
            if n_missing as f64 > limit {
                dropped.push(name);
            } else {
                keep_cols.push(name);
                keep_vals.push(col);
            }
        }
        self.columns = keep_cols;
        self.values = keep_vals;
        dropped
    }
}

/// Parse a phenotype table with `FID` and `IID` columns.
pub fn parse_phenotype_table(path: &Path) -> Result<PhenotypeTable> {
    let contents = std::fs::read_to_string(path).map_err(|e| InputError::unreadable(path, e))?;

    let mut lines = contents.lines();
    let header_line = lines.next().ok_or_else(|| InputError::Malformed {
        path: path.to_path_buf(),
        line: 1,
        message: "empty phenotype file".to_string(),
    })?;
    let headers: Vec<&str> = header_line.split_whitespace().collect();

    let find = |name: &str| {
        headers
            .iter()
            .position(|&h| h == name)
            .ok_or_else(|| InputError::MissingColumn {
                column: name.to_string(),
                path: path.to_path_buf(),
            })
    };
    let fid_idx = find("FID")?;
    let iid_idx = find("IID")?;

    let value_idx: Vec<usize> = (0..headers.len())
        .filter(|&i| i != fid_idx && i != iid_idx)
        .collect();

    let mut samples = Vec::new();
    let mut values: Vec<Vec<f64>> = vec![Vec::new(); value_idx.len()];

    for (line_num, line) in lines.enumerate() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.is_empty() {
            continue;
        }
        if fields.len() != headers.len() {
            return Err(InputError::Malformed {
                path: path.to_path_buf(),
                line: line_num + 2,
                message: format!(
                    "expected {} fields, found {}",
                    headers.len(),
                    fields.len()
                ),
            });
        }
        samples.push((fields[fid_idx].to_string(), fields[iid_idx].to_string()));
        for (col, &i) in values.iter_mut().zip(&value_idx) {
            col.push(parse_value(fields[i]));
        }
    }

    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    Ok(PhenotypeTable {
        name,
        samples,
        columns: value_idx.iter().map(|&i| headers[i].to_string()).collect(),
        values,
    })
}

/// Parse a string value to f64, treating NA/missing as NaN.
fn parse_value(s: &str) -> f64 {
    match s {
        "NA" | "na" | "Na" | "." | "" | "-" | "NaN" | "nan" => f64::NAN,
        _ => s.parse().unwrap_or(f64::NAN),
    }
}

/// Locate phenotype files by name.
///
/// For each name, `{in}/{name}.txt` or `{in}/{name}` wins when it exists;
/// otherwise every `*{name}*.txt` in `in_dir` is taken.
pub fn find_phenotype_files(in_dir: &Path, names: &[String]) -> Result<Vec<PathBuf>> {
    let mut listing: Option<Vec<String>> = None;
    let mut found = Vec::new();

    for name in names {
        let exact_txt = in_dir.join(format!("{}.txt", name));
        let exact = in_dir.join(name);
        if exact_txt.is_file() {
            found.push(exact_txt);
            continue;
        }
        if exact.is_file() {
            found.push(exact);
            continue;
        }

        if listing.is_none() {
            listing = Some(list_dir(in_dir)?);
        }
        let pattern = format!("*{}*.txt", name);
        for file in listing.iter().flatten() {
            if glob_match(&pattern, file) {
                debug!("{} matched {}", name, file);
                found.push(in_dir.join(file));
            }
        }
    }

    if found.is_empty() {
        return Err(InputError::NoPhenotypeFiles(names.to_vec()));
    }
    for f in &found {
        info!("Phenotype file: {}", f.display());
    }
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_value() {
        assert_eq!(parse_value("1.5"), 1.5);
        assert!(parse_value("NA").is_nan());
        assert!(parse_value(".").is_nan());
    }

    #[test]
    fn test_parse_table_and_drop_sparse() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cog.txt");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "FID IID fluid sparse").unwrap();
        writeln!(f, "1 1 0.5 NA").unwrap();
        writeln!(f, "2 2 1.5 NA").unwrap();
        writeln!(f, "3 3 NA 2.0").unwrap();

        let mut table = parse_phenotype_table(&path).unwrap();
        assert_eq!(table.name, "cog");
        assert_eq!(table.samples[2], ("3".to_string(), "3".to_string()));
        assert_eq!(table.columns, vec!["fluid", "sparse"]);
        assert_eq!(table.values[0][1], 1.5);

        let dropped = table.drop_sparse_columns(0.5);
        assert_eq!(dropped, vec!["sparse"]);
        assert_eq!(table.columns, vec!["fluid"]);
    }

    #[test]
    fn test_missing_iid_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.txt");
        std::fs::write(&path, "FID x\n1 2\n").unwrap();
        assert!(matches!(
            parse_phenotype_table(&path).unwrap_err(),
            InputError::MissingColumn { .. }
        ));
    }

    #[test]
    fn test_find_exact_then_scan() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["cog.txt", "mood_a.txt", "mood_b.txt", "mood.csv"] {
            std::fs::write(dir.path().join(name), "FID IID\n").unwrap();
        }
        let found =
            find_phenotype_files(dir.path(), &["cog".to_string(), "mood".to_string()]).unwrap();
        assert_eq!(
            found,
            vec![
                dir.path().join("cog.txt"),
                dir.path().join("mood_a.txt"),
                dir.path().join("mood_b.txt"),
            ]
        );
    }

    #[test]
    fn test_find_nothing() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            find_phenotype_files(dir.path(), &["x".to_string()]).unwrap_err(),
            InputError::NoPhenotypeFiles(_)
        ));
    }
}
