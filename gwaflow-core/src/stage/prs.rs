//! Polygenic score computation with plink2.
//!
//! Each phenotype in the GWA list has PRS-CS effect sizes split by
//! chromosome under `{in}/{prefix}/`; every chromosome is scored as its own
//! job into `{out}/{prefix}/{prefix}.chr{n}.sscore`.

use std::path::{Path, PathBuf};

use gwaflow_io::bed::{resolve_bed, BedSet};
use gwaflow_io::discovery::{expand_chromosomes, ChromosomeInput};
use gwaflow_io::gwa_list::parse_gwa_list;
use gwaflow_io::paths::{canonicalize, ensure_dir};
use gwaflow_io::{ExpectedOutputs, InputError};
use tracing::info;

use super::StagePlan;
use crate::command::CommandLine;
use crate::dispatch::{Dispatcher, ResourceProfile};
use crate::error::Result;

/// PRS-CS global shrinkage used when none is given.
pub const DEFAULT_PHI: f64 = 0.01;
pub const DEFAULT_PLINK: &str = "plink2";
pub const SCORE_SUFFIX: &str = ".sscore";

#[derive(Debug, Clone)]
pub struct PrsParams {
    /// GWA list; one phenotype per line.
    pub list: PathBuf,
    /// PRS-CS effect-size root.
    pub in_dir: PathBuf,
    pub out_dir: PathBuf,
    pub plink: PathBuf,
    pub bed: BedSet,
    pub phi: f64,
    pub force: bool,
}

impl PrsParams {
    pub fn new(
        list: &Path,
        in_dir: &Path,
        out_dir: &Path,
        plink: &Path,
        bed: &Path,
        phi: f64,
        force: bool,
    ) -> std::result::Result<Self, InputError> {
        Ok(Self {
            list: canonicalize(list)?,
            in_dir: canonicalize(in_dir)?,
            out_dir: canonicalize(out_dir)?,
            plink: plink.to_path_buf(),
            bed: resolve_bed(&canonicalize(bed)?)?,
            phi,
            force,
        })
    }
}

/// Scoring jobs go to the long partition when one is configured.
pub fn dispatcher(long_partition: Option<String>) -> Dispatcher {
    Dispatcher::new(
        "prs_score",
        ResourceProfile::new(1, 20).with_partition(long_partition),
    )
}

/// `{out}/{prefix}/{prefix}.chr{n}`
pub fn out_prefix(out_dir: &Path, prefix: &str, chrom: u8) -> PathBuf {
    out_dir.join(prefix).join(format!("{}.chr{}", prefix, chrom))
}

pub fn render(params: &PrsParams, input: &ChromosomeInput, out_prefix: &Path) -> CommandLine {
    CommandLine::new(params.plink.display())
        .opt_path("--bfile", params.bed.for_chromosome(input.chrom))
        .opt("--chr", input.chrom)
        .opt_path("--score", &input.effect_sizes)
        .arg(2)
        .arg(4)
        .arg(6)
        .arg("center")
        .arg("cols=fid,denom,dosagesum,scoresums")
        .opt_path("--out", out_prefix)
}

/// Queue scoring for every unscored chromosome of every listed phenotype.
pub fn plan(params: &PrsParams, dispatcher: &mut Dispatcher) -> Result<StagePlan> {
    let entries = parse_gwa_list(&params.list)?;
    ensure_dir(&params.out_dir)?;
    info!("prs: {} phenotype(s) in {}", entries.len(), params.list.display());

    let mut plan = StagePlan::default();
    for entry in &entries {
        ensure_dir(&params.out_dir.join(&entry.prefix))?;
        for input in expand_chromosomes(&params.in_dir, &entry.prefix, params.phi) {
            plan.discovered += 1;
            let out = out_prefix(&params.out_dir, &entry.prefix, input.chrom);
            let label = format!("{} chr{}", entry.prefix, input.chrom);
            plan.queue_unless_complete(
                dispatcher,
                &label,
                &ExpectedOutputs::with_suffixes(&out, &[SCORE_SUFFIX]),
                params.force,
                || Ok(render(params, &input, &out).render()),
            )?;
        }
    }

    plan.log_summary("prs");
    Ok(plan)
}
