//! LDSC heritability for every trait in the given phenotype groups.
//!
//! gwaflow heritability lipids -i ../gwa -o ../h2 --ldsc ~/ldsc

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use gwaflow_core::config::require_path;
use gwaflow_core::stage::heritability::{self, HeritabilityParams};
use gwaflow_core::PipelineConfig;

use super::{flush, report, DispatchArgs};

#[derive(Args, Debug)]
pub struct HeritabilityArgs {
    /// Phenotype groups; all when omitted
    groups: Vec<String>,

    #[arg(short, long = "in", default_value = "../gwa")]
    input: PathBuf,

    #[arg(short, long, default_value = "../h2")]
    out: PathBuf,

    /// LDSC installation (overrides [paths] ldsc)
    #[arg(long)]
    ldsc: Option<PathBuf>,

    /// Directory holding ldsc_master.sh (overrides [paths] scripts)
    #[arg(long)]
    scripts: Option<PathBuf>,

    /// Summary statistics extension
    #[arg(short, long, default_value = "fastGWA")]
    ext: String,

    #[command(flatten)]
    dispatch: DispatchArgs,
}

pub fn run(args: HeritabilityArgs, config: &PipelineConfig) -> Result<()> {
    let ldsc = require_path(args.ldsc.as_deref(), config.paths.ldsc.as_deref(), "ldsc")?;
    let scripts = require_path(
        args.scripts.as_deref(),
        config.paths.scripts.as_deref(),
        "scripts",
    )?;
    let mut params =
        HeritabilityParams::new(&args.input, &args.out, &ldsc, &scripts, args.dispatch.force)?;
    params.ext = args.ext;

    let mut dispatcher = heritability::dispatcher();
    let plan = heritability::plan(&params, &args.groups, &mut dispatcher)?;
    report("heritability", &plan);
    flush(vec![dispatcher], config, args.dispatch.debug)
}
