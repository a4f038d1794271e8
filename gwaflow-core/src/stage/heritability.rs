//! SNP heritability via LD-score regression.
//!
//! Two LDSC steps per trait, chained in one job:
//! 1. `munge_sumstats.py` -> `{out}/{group}/{prefix}.sumstats`
//! 2. `ldsc.py --h2`      -> `{out}/{group}/{prefix}.h2.log`
//!
//! Munging is skipped when its output already exists. A `.h2.log` without
//! a parseable estimate is deleted before the completion check so the
//! regression reruns.

use std::path::{Path, PathBuf};

use gwaflow_io::discovery::{discover, resolve_groups};
use gwaflow_io::h2_log::{validate_h2_log, H2Status};
use gwaflow_io::paths::{canonicalize, ensure_dir};
use gwaflow_io::{ExpectedOutputs, GwaFile, InputError};
use tracing::info;

use super::StagePlan;
use crate::command::{chain, CommandLine};
use crate::dispatch::{Dispatcher, ResourceProfile};
use crate::error::Result;

pub const SUMSTATS_SUFFIX: &str = ".sumstats";
pub const H2_LOG_SUFFIX: &str = ".h2.log";

#[derive(Debug, Clone)]
pub struct HeritabilityParams {
    pub in_dir: PathBuf,
    pub out_dir: PathBuf,
    /// LDSC installation; reference scores live under `baseline/`.
    pub ldsc: PathBuf,
    /// Directory holding `ldsc_master.sh`.
    pub scripts: PathBuf,
    pub ext: String,
    pub force: bool,
}

impl HeritabilityParams {
    pub fn new(
        in_dir: &Path,
        out_dir: &Path,
        ldsc: &Path,
        scripts: &Path,
        force: bool,
    ) -> std::result::Result<Self, InputError> {
        Ok(Self {
            in_dir: canonicalize(in_dir)?,
            out_dir: canonicalize(out_dir)?,
            ldsc: canonicalize(ldsc)?,
            scripts: canonicalize(scripts)?,
            ext: "fastGWA".to_string(),
            force,
        })
    }
}

pub fn dispatcher() -> Dispatcher {
    Dispatcher::new("heritability", ResourceProfile::new(1, 30))
}

/// `{out}/{prefix}` with both LDSC suffixes.
pub fn expected_outputs(out_prefix: &Path) -> ExpectedOutputs {
    ExpectedOutputs::with_suffixes(out_prefix, &[SUMSTATS_SUFFIX, H2_LOG_SUFFIX])
}

fn with_suffix(prefix: &Path, suffix: &str) -> PathBuf {
    let mut s = prefix.as_os_str().to_os_string();
    s.push(suffix);
    PathBuf::from(s)
}

/// Render the job for one trait. `munge` controls whether the
/// summary-statistics conversion runs first.
pub fn render(params: &HeritabilityParams, file: &GwaFile, out_prefix: &Path, munge: bool) -> String {
    let master = params.scripts.join("ldsc_master.sh");
    let baseline = format!("{}/baseline/", params.ldsc.display());

    let regression = CommandLine::new("bash")
        .path(&master)
        .arg("ldsc.py")
        .opt("--ref-ld-chr", &baseline)
        .opt("--w-ld-chr", &baseline)
        .opt_path("--h2", &with_suffix(out_prefix, SUMSTATS_SUFFIX))
        .opt_path("--out", &with_suffix(out_prefix, ".h2"));

    if munge {
        let munge = CommandLine::new("bash")
            .path(&master)
            .arg("munge_sumstats.py")
            .opt_path("--sumstats", &file.path)
            .opt_path("--out", out_prefix);
        chain(&[munge, regression])
    } else {
        regression.render()
    }
}

pub fn plan(
    params: &HeritabilityParams,
    groups: &[String],
    dispatcher: &mut Dispatcher,
) -> Result<StagePlan> {
    ensure_dir(&params.out_dir)?;
    let groups = resolve_groups(&params.in_dir, groups)?;
    let scan = discover(&params.in_dir, &groups, &params.ext)?;

    let mut plan = StagePlan {
        discovered: scan.files.len(),
        warnings: scan.warnings.clone(),
        ..StagePlan::default()
    };

    for file in &scan.files {
        let group_out = params.out_dir.join(&file.group);
        ensure_dir(&group_out)?;
        let out_prefix = group_out.join(&file.prefix);
        let label = format!("{}/{}", file.group, file.prefix);

        if !params.force {
            if let H2Status::Invalidated = validate_h2_log(&with_suffix(&out_prefix, H2_LOG_SUFFIX))? {
                info!("{}: corrupt h2 log removed, re-queuing", label);
            }
        }

        let expected = expected_outputs(&out_prefix);
        let munge = params.force || !expected.paths()[0].is_file();
        plan.queue_unless_complete(dispatcher, &label, &expected, params.force, || {
            Ok(render(params, file, &out_prefix, munge))
        })?;
    }

    plan.log_summary("heritability");
    Ok(plan)
}
