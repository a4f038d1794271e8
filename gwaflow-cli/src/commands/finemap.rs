//! Fine-map every trait in the given phenotype groups.
//!
//! gwaflow finemap lipids -i ../gwa -o ../finemap -b ../params/bed

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use tracing::info;

use gwaflow_core::config::require_path;
use gwaflow_core::stage::finemap::{self, FinemapParams, DEFAULT_PVALUE};
use gwaflow_core::PipelineConfig;

use super::{flush, report, DispatchArgs};

#[derive(Args, Debug)]
pub struct FinemapArgs {
    /// Phenotype groups (subdirectories of the input); all when omitted
    groups: Vec<String>,

    /// Directory containing all summary statistics
    #[arg(short, long = "in", default_value = "../gwa")]
    input: PathBuf,

    /// Output directory
    #[arg(short, long, default_value = "../finemap")]
    out: PathBuf,

    /// Reference PLINK binaries for LD
    #[arg(short, long, default_value = "../params/bed")]
    bfile: PathBuf,

    /// Genome-wide p-value threshold
    #[arg(short, long = "pval", default_value_t = DEFAULT_PVALUE)]
    p: f64,

    /// Directory holding pymaster.sh (overrides [paths] scripts)
    #[arg(long)]
    scripts: Option<PathBuf>,

    #[command(flatten)]
    dispatch: DispatchArgs,
}

pub fn run(args: FinemapArgs, config: &PipelineConfig) -> Result<()> {
    let scripts = require_path(
        args.scripts.as_deref(),
        config.paths.scripts.as_deref(),
        "scripts",
    )?;
    let params = FinemapParams::new(
        &args.input,
        &args.out,
        &args.bfile,
        &scripts,
        args.p,
        args.dispatch.force,
    )?;
    info!("Input: {}", params.in_dir.display());
    info!("Output: {}", params.out_dir.display());

    let mut dispatcher = finemap::dispatcher();
    let plan = finemap::plan(&params, &args.groups, &mut dispatcher)?;
    report("finemap", &plan);
    flush(vec![dispatcher], config, args.dispatch.debug)
}
