//! Subcommand implementations and the plumbing they share.

pub mod finemap;
pub mod heritability;
pub mod mr;
pub mod pheno_decomp;
pub mod prs_score;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use tracing::{info, warn};

use gwaflow_core::{Dispatcher, PipelineConfig, SlurmScheduler, StagePlan};

/// Environment variable naming the config file when `--config` is absent.
pub const CONFIG_ENV: &str = "GWAFLOW_CONFIG";

/// Options every dispatching subcommand takes.
#[derive(Args, Debug, Clone)]
pub struct DispatchArgs {
    /// Recompute even when outputs exist
    #[arg(short, long)]
    pub force: bool,

    /// Print the job scripts instead of submitting them
    #[arg(long)]
    pub debug: bool,
}

/// Resolve the config file: `--config`, then `$GWAFLOW_CONFIG`, then
/// built-in defaults.
pub fn load_config(cli: Option<&Path>) -> Result<PipelineConfig> {
    let path = cli
        .map(Path::to_path_buf)
        .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from));
    match path {
        Some(path) => {
            info!("Config: {}", path.display());
            PipelineConfig::load(&path)
                .with_context(|| format!("loading config {}", path.display()))
        }
        None => Ok(PipelineConfig::default()),
    }
}

/// Report what planning found.
pub fn report(stage: &str, plan: &StagePlan) {
    for w in &plan.warnings {
        warn!("{}: group '{}' skipped: {}", stage, w.group, w.reason);
    }
    eprintln!(
        "{}: {} item(s), {} queued, {} already complete",
        stage, plan.discovered, plan.queued, plan.skipped
    );
}

/// Submit each batch, or print what would be submitted.
pub fn flush(dispatchers: Vec<Dispatcher>, config: &PipelineConfig, debug: bool) -> Result<()> {
    let mut scheduler = SlurmScheduler::new(config.scheduler.clone());
    for dispatcher in dispatchers {
        let name = dispatcher.name().to_string();
        if debug {
            print!("{}", dispatcher.debug(&scheduler));
            continue;
        }
        let records = dispatcher
            .submit(&mut scheduler)
            .with_context(|| format!("submitting batch '{}'", name))?;
        for r in &records {
            println!("{}\t{}\t{} task(s)", r.name, r.job_id, r.n_tasks);
        }
    }
    Ok(())
}

