//! Mendelian randomisation between two sets of phenotype groups.
//!
//! gwaflow mr --p1 deg_local clu_local --p2 disorders_for_mr --n2 ../params/n2.txt

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use gwaflow_core::config::require_path;
use gwaflow_core::stage::mr::{self, MrDispatchers, MrParams, DEFAULT_CLUMP_PVALUE, DEFAULT_ENV};
use gwaflow_core::PipelineConfig;
use gwaflow_io::paths::canonicalize_opt;
use gwaflow_io::sample_size::SampleSizeArg;

use super::{flush, report, DispatchArgs};

#[derive(Args, Debug)]
pub struct MrArgs {
    /// Input directory holding both sets of groups
    #[arg(short, long = "in", default_value = "../gwa")]
    input: PathBuf,

    /// Exposure phenotype groups
    #[arg(long = "p1", alias = "pheno1", num_args = 1.., required = true)]
    p1: Vec<String>,

    /// Extension for exposure groups
    #[arg(long = "e1", alias = "ext1", default_value = "fastGWA")]
    ext1: String,

    /// Exposure sample size: a number, or a two-column table (prefix, n)
    #[arg(long = "n1", default_value = "54030")]
    n1: SampleSizeArg,

    /// Outcome phenotype groups
    #[arg(long = "p2", alias = "pheno2", num_args = 1.., required = true)]
    p2: Vec<String>,

    #[arg(long = "e2", alias = "ext2", default_value = "txt")]
    ext2: String,

    /// Outcome sample size: a number, or a table with 2 (prefix, n) or
    /// 4 (prefix, n, cases, controls) columns
    #[arg(long = "n2", default_value = "../params/disorder_sample_size.txt")]
    n2: SampleSizeArg,

    /// Cases among a numeric --n2
    #[arg(long)]
    nca: Option<u64>,

    /// Directory of clumping outputs
    #[arg(short, long, default_value = "../clump")]
    clump: PathBuf,

    /// LD scores for LCV (overrides [paths] ldscore)
    #[arg(long)]
    ldsc: Option<PathBuf>,

    /// Clumping p-value threshold
    #[arg(long, default_value_t = DEFAULT_CLUMP_PVALUE)]
    pval: f64,

    /// Directory of the MR R scripts (overrides [paths] r_scripts)
    #[arg(long)]
    r_scripts: Option<PathBuf>,

    /// Environment activated before each job
    #[arg(long, default_value = DEFAULT_ENV)]
    env: String,

    #[arg(short, long, default_value = "../mr")]
    out: PathBuf,

    #[command(flatten)]
    dispatch: DispatchArgs,
}

pub fn run(args: MrArgs, config: &PipelineConfig) -> Result<()> {
    let ldscore = require_path(args.ldsc.as_deref(), config.paths.ldscore.as_deref(), "ldscore")?;
    let mut params = MrParams::new(
        &args.input,
        &args.out,
        &args.clump,
        &ldscore,
        args.n1,
        args.n2,
        args.dispatch.force,
    )?;
    params.ext1 = args.ext1;
    params.ext2 = args.ext2;
    params.nca = args.nca;
    params.pval = args.pval;
    params.env = args.env;
    params.r_scripts = match args.r_scripts {
        Some(dir) => canonicalize_opt(Some(dir.as_path()))?,
        None => config.paths.r_scripts.clone(),
    };

    let mut dispatchers = MrDispatchers::new(&args.p2, &params.env);
    let plan = mr::plan(&params, &args.p1, &args.p2, &mut dispatchers)?;
    report("mr", &plan);
    flush(
        vec![dispatchers.main, dispatchers.cause],
        config,
        args.dispatch.debug,
    )
}
