//! Per-phenotype sample sizes for pairwise analyses.
//!
//! A side of an MR analysis takes its sample sizes either from one number
//! applied to every phenotype, or from a table keyed by phenotype name.
//! Tables have a header line and exactly one of two shapes:
//! ```text
//! pheno   n                       (2 columns)
//! pheno   n   n_cases  n_controls (4 columns)
//! ```
//! Any other column count violates the input contract.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{InputError, Result};

/// Sample size of one phenotype. Case/control counts are only present
/// for binary traits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleSize {
    pub n: u64,
    pub cases: Option<u64>,
    pub controls: Option<u64>,
}

impl SampleSize {
    pub fn total(n: u64) -> Self {
        Self {
            n,
            cases: None,
            controls: None,
        }
    }

    /// Total size with `cases` cases; the rest are controls.
    pub fn with_cases(n: u64, cases: u64) -> Result<Self> {
        if cases > n {
            return Err(InputError::CasesExceedTotal { cases, n });
        }
        Ok(Self {
            n,
            cases: Some(cases),
            controls: Some(n - cases),
        })
    }
}

/// A `-n` style argument: a number, or a path to a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SampleSizeArg {
    Count(u64),
    Table(PathBuf),
}

impl FromStr for SampleSizeArg {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s.trim().parse::<u64>() {
            Ok(n) => SampleSizeArg::Count(n),
            Err(_) => SampleSizeArg::Table(PathBuf::from(s)),
        })
    }
}

/// Parsed sample-size table.
#[derive(Debug, Clone)]
pub struct SampleSizeTable {
    path: PathBuf,
    entries: HashMap<String, SampleSize>,
}

impl SampleSizeTable {
    /// Parse a table accepting both the 2- and the 4-column shape.
    pub fn parse<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::parse_with(path.as_ref(), true)
    }

    /// Parse a table that must have exactly 2 columns.
    pub fn parse_totals_only<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::parse_with(path.as_ref(), false)
    }

    fn parse_with(path: &Path, allow_case_control: bool) -> Result<Self> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| InputError::unreadable(path, e))?;

        let mut lines = contents.lines().enumerate().filter(|(_, l)| !l.trim().is_empty());
        let (_, header) = lines.next().ok_or_else(|| InputError::Malformed {
            path: path.to_path_buf(),
            line: 1,
            message: "empty sample size table".to_string(),
        })?;

        let split = |line: &str| -> Vec<String> {
            if header.contains('\t') {
                line.split('\t').map(|s| s.trim().to_string()).collect()
            } else {
                line.split_whitespace().map(str::to_string).collect()
            }
        };

        let columns = split(header).len();
        let shape_ok = columns == 2 || (allow_case_control && columns == 4);
        if !shape_ok {
            return Err(InputError::SampleTableShape {
                path: path.to_path_buf(),
                columns,
            });
        }

        let mut entries = HashMap::new();
        for (idx, line) in lines {
            let fields = split(line);
            if fields.len() != columns {
                return Err(InputError::Malformed {
                    path: path.to_path_buf(),
                    line: idx + 1,
                    message: format!("expected {} fields, found {}", columns, fields.len()),
                });
            }
            let count = |value: &str| parse_count(path, idx + 1, value);
            let n = count(&fields[1])?.ok_or_else(|| InputError::SampleTableValue {
                path: path.to_path_buf(),
                line: idx + 1,
                value: fields[1].clone(),
            })?;
            let size = if columns == 4 {
                SampleSize {
                    n,
                    cases: count(&fields[2])?,
                    controls: count(&fields[3])?,
                }
            } else {
                SampleSize::total(n)
            };
            entries.insert(fields[0].clone(), size);
        }

        Ok(Self {
            path: path.to_path_buf(),
            entries,
        })
    }

    pub fn get(&self, pheno: &str) -> Result<SampleSize> {
        self.entries
            .get(pheno)
            .copied()
            .ok_or_else(|| InputError::MissingSampleSize {
                pheno: pheno.to_string(),
                path: self.path.clone(),
            })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Parse a count cell. Missing markers give `None`; counts written as
/// floats (`54030.0`) are accepted when integral.
fn parse_count(path: &Path, line: usize, value: &str) -> Result<Option<u64>> {
    match value {
        "NA" | "na" | "NaN" | "nan" | "" | "." => return Ok(None),
        _ => {}
    }
    let bad = || InputError::SampleTableValue {
        path: path.to_path_buf(),
        line,
        value: value.to_string(),
    };
    if let Ok(n) = value.parse::<u64>() {
        return Ok(Some(n));
    }
    let f: f64 = value.parse().map_err(|_| bad())?;
    if f.is_finite() && f >= 0.0 && f.fract() == 0.0 {
        Ok(Some(f as u64))
    } else {
        Err(bad())
    }
}

/// Where one side of a pairwise analysis gets its sample sizes.
#[derive(Debug, Clone)]
pub enum SampleSizeSource {
    Fixed(SampleSize),
    Table(SampleSizeTable),
}

impl SampleSizeSource {
    /// Resolve a side that may carry case/control counts.
    ///
    /// `cases` only applies to a fixed count; tables carry their own.
    pub fn resolve(arg: &SampleSizeArg, cases: Option<u64>) -> Result<Self> {
        match arg {
            SampleSizeArg::Count(n) => Ok(SampleSizeSource::Fixed(match cases {
                Some(c) => SampleSize::with_cases(*n, c)?,
                None => SampleSize::total(*n),
            })),
            SampleSizeArg::Table(path) => Ok(SampleSizeSource::Table(SampleSizeTable::parse(path)?)),
        }
    }

    /// Resolve a side that only ever has total counts.
    pub fn resolve_totals(arg: &SampleSizeArg) -> Result<Self> {
        match arg {
            SampleSizeArg::Count(n) => Ok(SampleSizeSource::Fixed(SampleSize::total(*n))),
            SampleSizeArg::Table(path) => Ok(SampleSizeSource::Table(
                SampleSizeTable::parse_totals_only(path)?,
            )),
        }
    }

    pub fn lookup(&self, pheno: &str) -> Result<SampleSize> {
        match self {
            SampleSizeSource::Fixed(size) => Ok(*size),
            SampleSizeSource::Table(table) => table.get(pheno),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_table(dir: &Path, rows: &[&str]) -> PathBuf {
        let path = dir.join("n.txt");
        let mut f = std::fs::File::create(&path).unwrap();
        for row in rows {
            writeln!(f, "{}", row).unwrap();
        }
        path
    }

    #[test]
    fn test_two_column_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_table(dir.path(), &["pheno\tn", "scz\t130644", "bip\t413466"]);
        let table = SampleSizeTable::parse(&path).unwrap();
        assert_eq!(table.len(), 2);
        let scz = table.get("scz").unwrap();
        assert_eq!(scz.n, 130644);
        assert_eq!(scz.cases, None);
        assert_eq!(scz.controls, None);
    }

    #[test]
    fn test_four_column_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_table(
            dir.path(),
            &["pheno\tn\tnca\tnco", "scz\t130644\t53386\t77258"],
        );
        let scz = SampleSizeTable::parse(&path).unwrap().get("scz").unwrap();
        assert_eq!(scz.cases, Some(53386));
        assert_eq!(scz.controls, Some(77258));
    }

    #[test]
    fn test_three_and_five_columns_rejected() {
        let dir = tempfile::tempdir().unwrap();
        for header in ["pheno\tn\tnca", "pheno\tn\tnca\tnco\textra"] {
            let path = write_table(dir.path(), &[header]);
            let err = SampleSizeTable::parse(&path).unwrap_err();
            assert!(matches!(err, InputError::SampleTableShape { .. }), "{}", header);
        }
    }

    #[test]
    fn test_totals_only_rejects_four_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_table(dir.path(), &["pheno\tn\tnca\tnco", "a\t10\t5\t5"]);
        let err = SampleSizeTable::parse_totals_only(&path).unwrap_err();
        assert!(matches!(err, InputError::SampleTableShape { columns: 4, .. }));
    }

    #[test]
    fn test_whitespace_table_and_float_counts() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_table(dir.path(), &["pheno n", "hdl 54030.0"]);
        let table = SampleSizeTable::parse(&path).unwrap();
        assert_eq!(table.get("hdl").unwrap().n, 54030);
    }

    #[test]
    fn test_missing_phenotype() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_table(dir.path(), &["pheno\tn", "hdl\t10"]);
        let table = SampleSizeTable::parse(&path).unwrap();
        assert!(matches!(
            table.get("ldl").unwrap_err(),
            InputError::MissingSampleSize { .. }
        ));
    }

    #[test]
    fn test_fixed_with_cases() {
        let source = SampleSizeSource::resolve(&SampleSizeArg::Count(1000), Some(400)).unwrap();
        let size = source.lookup("anything").unwrap();
        assert_eq!(size.cases, Some(400));
        assert_eq!(size.controls, Some(600));
        assert!(SampleSizeSource::resolve(&SampleSizeArg::Count(10), Some(11)).is_err());
    }

    #[test]
    fn test_arg_parsing() {
        assert_eq!("54030".parse::<SampleSizeArg>().unwrap(), SampleSizeArg::Count(54030));
        assert_eq!(
            "../params/n.txt".parse::<SampleSizeArg>().unwrap(),
            SampleSizeArg::Table(PathBuf::from("../params/n.txt"))
        );
    }
}
