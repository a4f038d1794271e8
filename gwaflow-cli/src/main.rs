//! gwaflow: batch orchestration for post-GWAS analyses.
//!
//! CLI entry point using clap for argument parsing.

mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "gwaflow",
    version,
    about = "Batch-submit post-GWAS analyses as cluster array jobs",
    long_about = "Scans GWAS summary statistics, skips traits whose outputs already exist,\n\
                   and submits the remaining per-trait commands as SLURM array jobs."
)]
struct Cli {
    /// Pipeline config (TOML); falls back to $GWAFLOW_CONFIG
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Verbosity level (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fine-map every trait with PolyFun + SuSiE
    Finemap(commands::finemap::FinemapArgs),

    /// SNP heritability with LD-score regression
    Heritability(commands::heritability::HeritabilityArgs),

    /// Mendelian randomisation between two sets of phenotype groups
    Mr(commands::mr::MrArgs),

    /// Per-chromosome polygenic scores with plink2
    PrsScore(commands::prs_score::PrsScoreArgs),

    /// Effective number of independent phenotypes (runs locally)
    PhenoDecomp(commands::pheno_decomp::PhenoDecompArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("gwaflow v{}", env!("CARGO_PKG_VERSION"));

    let config = commands::load_config(cli.config.as_deref())?;
    match cli.command {
        Commands::Finemap(args) => commands::finemap::run(args, &config),
        Commands::Heritability(args) => commands::heritability::run(args, &config),
        Commands::Mr(args) => commands::mr::run(args, &config),
        Commands::PrsScore(args) => commands::prs_score::run(args, &config),
        Commands::PhenoDecomp(args) => commands::pheno_decomp::run(args),
    }
}
