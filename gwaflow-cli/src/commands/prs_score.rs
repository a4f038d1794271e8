//! Per-chromosome polygenic scores from PRS-CS effect sizes.
//!
//! gwaflow prs-score --list ../params/gwa_for_prs.list --bed ../params/bed

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use gwaflow_core::stage::prs::{self, PrsParams, DEFAULT_PHI, DEFAULT_PLINK};
use gwaflow_core::PipelineConfig;
use gwaflow_io::paths::canonicalize;

use super::{flush, report, DispatchArgs};

#[derive(Args, Debug)]
pub struct PrsScoreArgs {
    /// GWA list: absolute path to summary statistics in the first column
    #[arg(long, default_value = "../params/gwa_for_prs.list")]
    list: PathBuf,

    /// PRS-CS effect-size directory
    #[arg(short, long = "in", default_value = "../prs/prs_effsize")]
    input: PathBuf,

    #[arg(short, long, default_value = "../prs/prs_score")]
    out: PathBuf,

    /// plink2 executable (overrides [paths] plink)
    #[arg(long)]
    plink: Option<PathBuf>,

    /// Target-sample PLINK binaries: prefix, .bed file, list, or directory
    #[arg(long, default_value = "../params/bed")]
    bed: PathBuf,

    /// Shrinkage parameter used for PRS-CS
    #[arg(long, default_value_t = DEFAULT_PHI)]
    phi: f64,

    #[command(flatten)]
    dispatch: DispatchArgs,
}

pub fn run(args: PrsScoreArgs, config: &PipelineConfig) -> Result<()> {
    let plink = args
        .plink
        .map(canonicalize)
        .transpose()?
        .or_else(|| config.paths.plink.clone())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_PLINK));
    let params = PrsParams::new(
        &args.list,
        &args.input,
        &args.out,
        &plink,
        &args.bed,
        args.phi,
        args.dispatch.force,
    )?;

    let mut dispatcher = prs::dispatcher(config.scheduler.long_partition.clone());
    let plan = prs::plan(&params, &mut dispatcher)?;
    report("prs-score", &plan);
    flush(vec![dispatcher], config, args.dispatch.debug)
}
