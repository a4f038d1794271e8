//! Phenotype redundancy: effective number of independent phenotypes.
//!
//! For every non-empty subset of phenotype files, the absolute correlation
//! matrix of the subset's columns is eigen-decomposed and summarised with
//! Nyholt's (2004) estimate
//!
//! ```text
//! neff = n * (1 - (n - 1) * var(l) / n^2)
//! ```
//!
//! where `l` are the `n` eigenvalues and `var` is the population variance.
//! The matching family-wise threshold is `1 - 0.95^(1 / neff)`. `old`
//! columns use the raw eigenvalues, `new` columns clip negative ones to 0.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use faer::Mat;
use gwaflow_io::phenotype::{find_phenotype_files, parse_phenotype_table, PhenotypeTable};
use gwaflow_io::sample::{gather_f64, union_samples, SampleKey};
use tracing::{info, warn};

use crate::error::{DriverError, Result};

/// Columns more than this fraction missing are dropped before analysis.
pub const MAX_MISSING: f64 = 0.5;

/// One subset of phenotype files and its estimates.
#[derive(Debug, Clone, PartialEq)]
pub struct RedundancyRow {
    /// `subset[k]` = file `k` is included.
    pub subset: Vec<bool>,
    pub n_old: f64,
    pub p_old: f64,
    pub n_new: f64,
    pub p_new: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RedundancyReport {
    /// One label per phenotype file.
    pub names: Vec<String>,
    pub rows: Vec<RedundancyRow>,
}

impl RedundancyReport {
    /// Tab-separated, one row per subset, subsets as `True`/`False`.
    pub fn to_tsv(&self) -> String {
        let mut out = String::from("n_old\tp_old\tn_new\tp_new");
        for name in &self.names {
            out.push('\t');
            out.push_str(name);
        }
        out.push('\n');
        for row in &self.rows {
            let _ = write!(
                out,
                "{:?}\t{:?}\t{:?}\t{:?}",
                row.n_old, row.p_old, row.n_new, row.p_new
            );
            for &included in &row.subset {
                out.push_str(if included { "\tTrue" } else { "\tFalse" });
            }
            out.push('\n');
        }
        out
    }

    pub fn write_tsv(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_tsv()).map_err(|source| DriverError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Nyholt's effective number of tests from correlation eigenvalues.
pub fn effective_number(eigenvalues: &[f64]) -> f64 {
    let n = eigenvalues.len() as f64;
    let mean = eigenvalues.iter().sum::<f64>() / n;
    let var = eigenvalues.iter().map(|l| (l - mean).powi(2)).sum::<f64>() / n;
    n * (1.0 - (n - 1.0) * var / (n * n))
}

/// Per-test threshold keeping the family-wise error rate at 5%.
pub fn sidak_threshold(neff: f64) -> f64 {
    1.0 - 0.95f64.powf(1.0 / neff)
}

/// All index combinations of `0..n`, by size, lexicographic within a size.
pub fn combinations(n: usize) -> Vec<Vec<usize>> {
    let mut all = Vec::new();
    for k in 1..=n {
        let mut idx: Vec<usize> = (0..k).collect();
        loop {
            all.push(idx.clone());
            // rightmost position that can still advance
            let Some(i) = (0..k).rev().find(|&i| idx[i] != i + n - k) else {
                break;
            };
            idx[i] += 1;
            for j in i + 1..k {
                idx[j] = idx[j - 1] + 1;
            }
        }
    }
    all
}

/// Pearson correlation over rows where both values are present. `None`
/// when fewer than two rows overlap or either side is constant.
pub fn pairwise_pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = x
        .iter()
        .zip(y)
        .filter(|(a, b)| !a.is_nan() && !b.is_nan())
        .map(|(&a, &b)| (a, b))
        .collect();
    if pairs.len() < 2 {
        return None;
    }
    let n = pairs.len() as f64;
    let mx = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let my = pairs.iter().map(|p| p.1).sum::<f64>() / n;
    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (a, b) in &pairs {
        sxy += (a - mx) * (b - my);
        sxx += (a - mx).powi(2);
        syy += (b - my).powi(2);
    }
    if sxx == 0.0 || syy == 0.0 {
        return None;
    }
    Some(sxy / (sxx * syy).sqrt())
}

/// Absolute correlation matrix of `columns`. Undefined correlations count
/// as 0; the number of such pairs is returned alongside.
pub fn abs_correlation(columns: &[&[f64]]) -> (Mat<f64>, usize) {
    let p = columns.len();
    let mut undefined = 0;
    let mut r = vec![0.0; p * p];
    for i in 0..p {
        r[i * p + i] = 1.0;
        for j in 0..i {
            let value = match pairwise_pearson(columns[i], columns[j]) {
                Some(c) => c.abs(),
                None => {
                    undefined += 1;
                    0.0
                }
            };
            r[i * p + j] = value;
            r[j * p + i] = value;
        }
    }
    (Mat::from_fn(p, p, |i, j| r[i * p + j]), undefined)
}

/// Eigenvalues of a symmetric matrix, descending.
pub fn symmetric_eigenvalues(mat: &Mat<f64>) -> Vec<f64> {
    let eigen = mat.selfadjoint_eigendecomposition(faer::Side::Lower);
    let s = eigen.s();
    let mut evals: Vec<f64> = (0..mat.nrows()).map(|i| s.column_vector().read(i)).collect();
    evals.sort_by(|a, b| b.total_cmp(a));
    evals
}

/// Estimates for every subset of `tables`, aligned on (FID, IID).
pub fn analyse(tables: &[PhenotypeTable]) -> Result<RedundancyReport> {
    if tables.is_empty() {
        return Err(DriverError::Analysis("no phenotype tables".to_string()));
    }
    if let Some(empty) = tables.iter().find(|t| t.columns.is_empty()) {
        return Err(DriverError::Analysis(format!(
            "{} has no usable phenotype columns",
            empty.name
        )));
    }

    let keys: Vec<&[SampleKey]> = tables.iter().map(|t| t.samples.as_slice()).collect();
    let union = union_samples(&keys);
    info!(
        "{} table(s), {} sample(s) after outer join",
        tables.len(),
        union.keys.len()
    );

    // aligned[t][c] = column c of table t over the joined samples
    let aligned: Vec<Vec<Vec<f64>>> = tables
        .iter()
        .zip(&union.indices)
        .map(|(t, idx)| t.values.iter().map(|col| gather_f64(col, idx)).collect())
        .collect();

    let mut rows = Vec::new();
    for combo in combinations(tables.len()) {
        let columns: Vec<&[f64]> = combo
            .iter()
            .flat_map(|&t| aligned[t].iter().map(Vec::as_slice))
            .collect();
        let (corr, undefined) = abs_correlation(&columns);
        if undefined > 0 {
            warn!(
                "{} undefined correlation(s) in subset {:?}, treated as 0",
                undefined, combo
            );
        }
        let raw = symmetric_eigenvalues(&corr);
        let clipped: Vec<f64> = raw.iter().map(|&l| l.max(0.0)).collect();
        let n_old = effective_number(&raw);
        let n_new = effective_number(&clipped);

        let mut subset = vec![false; tables.len()];
        for &t in &combo {
            subset[t] = true;
        }
        rows.push(RedundancyRow {
            subset,
            n_old,
            p_old: sidak_threshold(n_old),
            n_new,
            p_new: sidak_threshold(n_new),
        });
    }

    Ok(RedundancyReport {
        names: tables.iter().map(|t| t.name.clone()).collect(),
        rows,
    })
}

/// Locate, load and analyse the named phenotype files, then write the
/// report to `out`. Runs locally; nothing is dispatched.
pub fn run(in_dir: &Path, names: &[String], out: &Path) -> Result<RedundancyReport> {
    let files: Vec<PathBuf> = find_phenotype_files(in_dir, names)?;
    let mut tables = Vec::with_capacity(files.len());
    for path in &files {
        let mut table = parse_phenotype_table(path)?;
        let dropped = table.drop_sparse_columns(MAX_MISSING);
        if !dropped.is_empty() {
            info!("{}: dropped sparse column(s) {:?}", table.name, dropped);
        }
        tables.push(table);
    }

    let report = analyse(&tables)?;
    report.write_tsv(out)?;
    info!("{} subset(s) written to {}", report.rows.len(), out.display());
    Ok(report)
}
