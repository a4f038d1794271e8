//! Input-contract errors.
//!
//! Everything in this crate that can abort a driver before submission
//! reports one of these variants.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum InputError {
    #[error("failed to read {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("input directory not found: {0}")]
    MissingDirectory(PathBuf),

    #[error(
        "sample size table {path} has {columns} columns; expected 2 (name, n) or 4 (name, n, cases, controls)"
    )]
    SampleTableShape { path: PathBuf, columns: usize },

    #[error("sample size table {path} line {line}: cannot parse '{value}' as a count")]
    SampleTableValue {
        path: PathBuf,
        line: usize,
        value: String,
    },

    #[error("no sample size for phenotype '{pheno}' in {path}")]
    MissingSampleSize { pheno: String, path: PathBuf },

    #[error("case count {cases} exceeds total sample size {n}")]
    CasesExceedTotal { cases: u64, n: u64 },

    #[error("no BED file found for '{0}'")]
    NoBedFile(PathBuf),

    #[error("{path}: {count} BED prefixes resolved; expected 1 or 22")]
    BedCount { path: PathBuf, count: usize },

    #[error("{path} line {line}: {message}")]
    Malformed {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("column '{column}' not found in header of {path}")]
    MissingColumn { column: String, path: PathBuf },

    #[error("no phenotype files found for {0:?}")]
    NoPhenotypeFiles(Vec<String>),
}

impl InputError {
    pub(crate) fn unreadable(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        InputError::Unreadable {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, InputError>;
