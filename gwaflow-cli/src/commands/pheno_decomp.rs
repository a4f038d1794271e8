//! Effective number of independent phenotypes.
//!
//! gwaflow pheno-decomp deg clu -i ../pheno/ukb -o ../pheno/neff.txt
//!
//! Runs locally; nothing is submitted.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use gwaflow_core::redundancy;
use gwaflow_io::paths::canonicalize;

#[derive(Args, Debug)]
pub struct PhenoDecompArgs {
    /// Phenotype names to scan for
    #[arg(required = true)]
    pheno: Vec<String>,

    /// Directory containing the phenotype tables
    #[arg(short, long = "in", default_value = "../pheno/ukb")]
    input: PathBuf,

    /// Output table
    #[arg(short, long)]
    out: PathBuf,
}

pub fn run(args: PhenoDecompArgs) -> Result<()> {
    let in_dir = canonicalize(&args.input)?;
    let out = canonicalize(&args.out)?;
    let report = redundancy::run(&in_dir, &args.pheno, &out)
        .with_context(|| format!("phenotype redundancy in {}", in_dir.display()))?;

    if let Some(all) = report.rows.last() {
        println!("Effective # variables (Nyholt 2004): {:.4}", all.n_old);
        println!("Threshold: {:.4e}", all.p_old);
        println!("Effective # variables, negative eigenvalues clipped: {:.4}", all.n_new);
        println!("Threshold: {:.4e}", all.p_new);
    }
    Ok(())
}
