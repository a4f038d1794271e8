//! PLINK reference genotype resolution.
//!
//! Scoring runs per chromosome against a PLINK binary fileset
//! (`.bed/.bim/.fam`). The reference can be given as:
//! - a `.bed` path (`/ref/ukb.bed` -> prefix `/ref/ukb`)
//! - a prefix whose `.bed` exists (`/ref/ukb`)
//! - a text file listing one prefix per line, chromosome order
//! - a directory holding one `*chr{n}.bed` per chromosome
//!
//! A single prefix serves all chromosomes.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::discovery::{list_dir, N_CHROMOSOMES};
use crate::error::{InputError, Result};
use crate::pattern::glob_match;

/// One PLINK prefix per autosome, index 0 = chromosome 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BedSet {
    prefixes: Vec<PathBuf>,
}

impl BedSet {
    pub fn for_chromosome(&self, chrom: u8) -> &Path {
        &self.prefixes[usize::from(chrom) - 1]
    }

    pub fn prefixes(&self) -> &[PathBuf] {
        &self.prefixes
    }
}

/// Resolve a `--bed` argument into 22 PLINK prefixes.
pub fn resolve_bed(bed: &Path) -> Result<BedSet> {
    let as_str = bed.to_string_lossy();
    let mut with_ext = bed.as_os_str().to_os_string();
    with_ext.push(".bed");
    let with_ext = PathBuf::from(with_ext);

    let mut prefixes: Vec<PathBuf> = if let Some(prefix) = as_str.strip_suffix(".bed") {
        vec![PathBuf::from(prefix)]
    } else if with_ext.is_file() {
        vec![bed.to_path_buf()]
    } else if bed.is_file() {
        let contents =
            std::fs::read_to_string(bed).map_err(|e| InputError::unreadable(bed, e))?;
        contents
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(PathBuf::from)
            .collect()
    } else if bed.is_dir() {
        let names = list_dir(bed)?;
        let mut found = Vec::new();
        for chrom in 1..=N_CHROMOSOMES {
            let pattern = format!("*chr{}.bed", chrom);
            for name in &names {
                if glob_match(&pattern, &name.to_lowercase()) {
                    let stem = &name[..name.len() - ".bed".len()];
                    debug!("chr{}: {}", chrom, stem);
                    found.push(bed.join(stem));
                }
            }
        }
        found
    } else {
        return Err(InputError::NoBedFile(bed.to_path_buf()));
    };

    match prefixes.len() {
        0 => Err(InputError::NoBedFile(bed.to_path_buf())),
        1 => {
            let only = prefixes.remove(0);
            Ok(BedSet {
                prefixes: vec![only; usize::from(N_CHROMOSOMES)],
            })
        }
        n if n == usize::from(N_CHROMOSOMES) => Ok(BedSet { prefixes }),
        count => Err(InputError::BedCount {
            path: bed.to_path_buf(),
            count,
        }),
    }
}
