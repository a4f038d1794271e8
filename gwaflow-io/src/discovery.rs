//! Work discovery over input namespaces.
//!
//! Input layout is `{in}/{group}/{prefix}.{ext}`: one directory per
//! phenotype group, one summary-statistics file per phenotype. Discovery
//! only ever reads input directories.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{InputError, Result};
use crate::format;
use crate::pattern::NameFilter;

/// Number of autosomes scored per phenotype.
pub const N_CHROMOSOMES: u8 = 22;

/// One summary-statistics file found by a scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GwaFile {
    /// Phenotype group (the input subdirectory).
    pub group: String,
    /// File name without the extension.
    pub prefix: String,
    /// Full path to the file.
    pub path: PathBuf,
}

/// A requested group that produced no work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryWarning {
    pub group: String,
    pub dir: PathBuf,
    pub reason: String,
}

/// Result of scanning one or more groups.
#[derive(Debug, Clone, Default)]
pub struct Scan {
    pub files: Vec<GwaFile>,
    pub warnings: Vec<DiscoveryWarning>,
}

impl Scan {
    /// Files belonging to one group, in scan order.
    pub fn group<'a>(&'a self, group: &'a str) -> impl Iterator<Item = &'a GwaFile> + 'a {
        self.files.iter().filter(move |f| f.group == group)
    }
}

/// Sorted file names of a directory.
pub fn list_dir(dir: &Path) -> Result<Vec<String>> {
    let entries = std::fs::read_dir(dir).map_err(|e| InputError::unreadable(dir, e))?;
    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| InputError::unreadable(dir, e))?;
        names.push(entry.file_name().to_string_lossy().into_owned());
    }
    names.sort();
    Ok(names)
}

/// Every phenotype group under `in_dir`, sorted. Used when the caller
/// names no groups.
pub fn list_groups(in_dir: &Path) -> Result<Vec<String>> {
    if !in_dir.is_dir() {
        return Err(InputError::MissingDirectory(in_dir.to_path_buf()));
    }
    Ok(list_dir(in_dir)?
        .into_iter()
        .filter(|name| in_dir.join(name).is_dir())
        .collect())
}

/// Resolve the group list: the explicit names, or every group on disk.
pub fn resolve_groups(in_dir: &Path, requested: &[String]) -> Result<Vec<String>> {
    if requested.is_empty() {
        list_groups(in_dir)
    } else {
        Ok(requested.to_vec())
    }
}

/// Scan `{in_dir}/{group}` for files with extension `ext`.
///
/// A missing or empty group directory is reported as a warning, not an
/// error.
pub fn scan_group(in_dir: &Path, group: &str, ext: &str, scan: &mut Scan) -> Result<()> {
    let dir = in_dir.join(group);
    let filter = NameFilter::for_extension(ext);
    let suffix = format!(".{}", ext.trim_start_matches('.'));

    if !dir.is_dir() {
        let w = DiscoveryWarning {
            group: group.to_string(),
            dir,
            reason: "group directory does not exist".to_string(),
        };
        warn!("{}: {} ({})", w.group, w.reason, w.dir.display());
        scan.warnings.push(w);
        return Ok(());
    }

    let before = scan.files.len();
    for name in list_dir(&dir)? {
        if !filter.matches(&name) {
            continue;
        }
        let prefix = match name.strip_suffix(&suffix) {
            Some(p) if !p.is_empty() => p.to_string(),
            _ => continue,
        };
        debug!("{}: found {}", group, name);
        scan.files.push(GwaFile {
            group: group.to_string(),
            prefix,
            path: dir.join(&name),
        });
    }

    if scan.files.len() == before {
        let w = DiscoveryWarning {
            group: group.to_string(),
            dir,
            reason: format!("no *{} files", suffix),
        };
        warn!("{}: {} ({})", w.group, w.reason, w.dir.display());
        scan.warnings.push(w);
    }
    Ok(())
}

/// Scan several groups with the same extension.
pub fn discover(in_dir: &Path, groups: &[String], ext: &str) -> Result<Scan> {
    if !in_dir.is_dir() {
        return Err(InputError::MissingDirectory(in_dir.to_path_buf()));
    }
    let mut scan = Scan::default();
    for group in groups {
        scan_group(in_dir, group, ext, &mut scan)?;
    }
    Ok(scan)
}

/// One chromosome's slice of a per-chromosome work item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChromosomeInput {
    pub chrom: u8,
    /// PRS-CS posterior effect sizes for this chromosome.
    pub effect_sizes: PathBuf,
}

/// PRS-CS output file name for one chromosome.
pub fn effect_size_file_name(chrom: u8, phi: f64) -> String {
    format!(
        "chr{c}_pst_eff_a1_b0.5_phi{phi}_chr{c}.txt",
        c = chrom,
        phi = format::threshold(phi)
    )
}

/// Expand one phenotype into its 22 ordered chromosome inputs under
/// `{in_dir}/{prefix}/`.
pub fn expand_chromosomes(in_dir: &Path, prefix: &str, phi: f64) -> Vec<ChromosomeInput> {
    let dir = in_dir.join(prefix);
    (1..=N_CHROMOSOMES)
        .map(|chrom| ChromosomeInput {
            chrom,
            effect_sizes: dir.join(effect_size_file_name(chrom, phi)),
        })
        .collect()
}

/// Every (left, right) pair, left-major.
pub fn cross_pairs<'a>(
    left: &'a [GwaFile],
    right: &'a [GwaFile],
) -> impl Iterator<Item = (&'a GwaFile, &'a GwaFile)> + 'a {
    left.iter()
        .flat_map(move |l| right.iter().map(move |r| (l, r)))
}
