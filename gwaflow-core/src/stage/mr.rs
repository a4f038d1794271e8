//! Pairwise Mendelian randomisation.
//!
//! Every file of every exposure group (`p1`) is paired with every file of
//! every outcome group (`p2`). Each pair gets up to three jobs, all writing
//! under `{out}/{group2}/{prefix2}/`:
//! - `mr_master.r`: IVW/Egger/PRESSO in both directions
//! - `mr_lcv.r`: latent causal variable model
//! - `mr_cause.r`: CAUSE, heavier, on its own dispatcher

use std::path::{Path, PathBuf};

use gwaflow_io::discovery::{cross_pairs, discover};
use gwaflow_io::paths::{canonicalize, ensure_dir};
use gwaflow_io::sample_size::{SampleSize, SampleSizeArg, SampleSizeSource};
use gwaflow_io::{format, ExpectedOutputs, GwaFile, InputError};
use tracing::info;

use super::StagePlan;
use crate::command::{CommandLine, FORCE_FLAG};
use crate::dispatch::{Dispatcher, ResourceProfile};
use crate::error::Result;

pub const DEFAULT_CLUMP_PVALUE: f64 = 1e-3;
pub const DEFAULT_ENV: &str = "gentoolsr";

pub const MAIN_SUFFIXES: [&str; 4] = [
    "_mr_forward_results.txt",
    "_mr_reverse_results.txt",
    "_mr_forward_presso_results.txt",
    "_mr_reverse_presso_results.txt",
];
pub const LCV_SUFFIXES: [&str; 1] = ["_mr_lcv_results.txt"];
pub const CAUSE_SUFFIXES: [&str; 2] = [
    "_mr_forward_cause_results.txt",
    "_mr_reverse_cause_results.txt",
];

#[derive(Debug, Clone)]
pub struct MrParams {
    pub in_dir: PathBuf,
    pub out_dir: PathBuf,
    /// Clumping results, `{clump}/{group}/{prefix}_{p}.clumped`.
    pub clump_dir: PathBuf,
    /// LD scores for LCV.
    pub ldscore: PathBuf,
    /// Directory of the R scripts; bare script names when `None`.
    pub r_scripts: Option<PathBuf>,
    pub ext1: String,
    pub ext2: String,
    /// Exposure sample sizes, totals only.
    pub n1: SampleSizeArg,
    /// Outcome sample sizes.
    pub n2: SampleSizeArg,
    /// Cases among a fixed `n2`.
    pub nca: Option<u64>,
    /// Clumping threshold; only used to name clump files.
    pub pval: f64,
    pub env: String,
    pub force: bool,
}

impl MrParams {
    pub fn new(
        in_dir: &Path,
        out_dir: &Path,
        clump_dir: &Path,
        ldscore: &Path,
        n1: SampleSizeArg,
        n2: SampleSizeArg,
        force: bool,
    ) -> std::result::Result<Self, InputError> {
        Ok(Self {
            in_dir: canonicalize(in_dir)?,
            out_dir: canonicalize(out_dir)?,
            clump_dir: canonicalize(clump_dir)?,
            ldscore: canonicalize(ldscore)?,
            r_scripts: None,
            ext1: "fastGWA".to_string(),
            ext2: "txt".to_string(),
            n1: canonical_arg(n1)?,
            n2: canonical_arg(n2)?,
            nca: None,
            pval: DEFAULT_CLUMP_PVALUE,
            env: DEFAULT_ENV.to_string(),
            force,
        })
    }
}

fn canonical_arg(arg: SampleSizeArg) -> std::result::Result<SampleSizeArg, InputError> {
    Ok(match arg {
        SampleSizeArg::Table(path) => SampleSizeArg::Table(canonicalize(path)?),
        count => count,
    })
}

/// The two batches an MR run fills.
#[derive(Debug)]
pub struct MrDispatchers {
    /// `mr_master.r` and `mr_lcv.r` jobs.
    pub main: Dispatcher,
    pub cause: Dispatcher,
}

impl MrDispatchers {
    /// Batches named after the outcome groups, e.g. `mr_disorders` and
    /// `mr_cause_disorders`.
    pub fn new(p2: &[String], env: &str) -> Self {
        let suffix = p2.join("_");
        Self {
            main: Dispatcher::new(
                format!("mr_{}", suffix),
                ResourceProfile::new(1, 20).with_env(env),
            ),
            cause: Dispatcher::new(
                format!("mr_cause_{}", suffix),
                ResourceProfile::new(3, 20).with_env(env),
            ),
        }
    }
}

/// One exposure/outcome pair with resolved sample sizes.
#[derive(Debug, Clone)]
pub struct MrPair<'a> {
    pub exposure: &'a GwaFile,
    pub outcome: &'a GwaFile,
    pub n1: SampleSize,
    pub n2: SampleSize,
}

impl MrPair<'_> {
    /// `{out}/{group2}/{prefix2}`
    pub fn out_dir(&self, out: &Path) -> PathBuf {
        out.join(&self.outcome.group).join(&self.outcome.prefix)
    }

    /// `{out}/{group2}/{prefix2}/{group1}_{prefix1}_{prefix2}`
    pub fn out_prefix(&self, out: &Path) -> PathBuf {
        self.out_dir(out).join(format!(
            "{}_{}_{}",
            self.exposure.group, self.exposure.prefix, self.outcome.prefix
        ))
    }
}

pub fn clump_file(params: &MrParams, file: &GwaFile) -> PathBuf {
    params.clump_dir.join(&file.group).join(format!(
        "{}_{}.clumped",
        file.prefix,
        format::threshold(params.pval)
    ))
}

fn rscript(params: &MrParams, script: &str) -> CommandLine {
    let cmd = CommandLine::new("Rscript");
    match &params.r_scripts {
        Some(dir) => cmd.path(&dir.join(script)),
        None => cmd.arg(script),
    }
}

pub fn render_main(params: &MrParams, pair: &MrPair<'_>) -> CommandLine {
    rscript(params, "mr_master.r")
        .opt_path("--g1", &pair.exposure.path)
        .opt_path("--c1", &clump_file(params, pair.exposure))
        .opt("--n1", pair.n1.n)
        .opt_path("--g2", &pair.outcome.path)
        .opt_path("--c2", &clump_file(params, pair.outcome))
        .opt("--n2", pair.n2.n)
        .opt_some("--nca", pair.n2.cases)
        .opt_some("--nco", pair.n2.controls)
        .opt_path("-o", &pair.out_dir(&params.out_dir))
        .flag_if(FORCE_FLAG, params.force)
}

pub fn render_lcv(params: &MrParams, pair: &MrPair<'_>) -> CommandLine {
    rscript(params, "mr_lcv.r")
        .opt_path("--g1", &pair.exposure.path)
        .opt_path("--g2", &pair.outcome.path)
        .opt("--n1", pair.n1.n)
        .opt("--n2", pair.n2.n)
        .opt_path("-o", &pair.out_dir(&params.out_dir))
        .opt_path("--ldsc", &params.ldscore)
        .flag_if(FORCE_FLAG, params.force)
}

pub fn render_cause(params: &MrParams, pair: &MrPair<'_>) -> CommandLine {
    rscript(params, "mr_cause.r")
        .opt_path("--g1", &pair.exposure.path)
        .opt_path("--c1", &clump_file(params, pair.exposure))
        .opt_path("--g2", &pair.outcome.path)
        .opt_path("--c2", &clump_file(params, pair.outcome))
        .opt_path("-o", &pair.out_dir(&params.out_dir))
        .flag_if(FORCE_FLAG, params.force)
}

/// Queue every incomplete MR job for `p1` x `p2`.
///
/// Sample sizes are resolved for every pair before the pair is queued, so
/// a phenotype missing from a table fails the run with nothing submitted.
pub fn plan(
    params: &MrParams,
    p1: &[String],
    p2: &[String],
    dispatchers: &mut MrDispatchers,
) -> Result<StagePlan> {
    ensure_dir(&params.out_dir)?;
    let n1_source = SampleSizeSource::resolve_totals(&params.n1)?;
    let n2_source = SampleSizeSource::resolve(&params.n2, params.nca)?;

    let exposures = discover(&params.in_dir, p1, &params.ext1)?;
    let outcomes = discover(&params.in_dir, p2, &params.ext2)?;
    info!(
        "mr: {} exposure file(s), {} outcome file(s)",
        exposures.files.len(),
        outcomes.files.len()
    );

    let mut plan = StagePlan::default();
    plan.warnings.extend(exposures.warnings.iter().cloned());
    plan.warnings.extend(outcomes.warnings.iter().cloned());

    for g2 in p2 {
        ensure_dir(&params.out_dir.join(g2))?;
        let files2: Vec<GwaFile> = outcomes.group(g2).cloned().collect();
        for g1 in p1 {
            let files1: Vec<GwaFile> = exposures.group(g1).cloned().collect();
            for (exposure, outcome) in cross_pairs(&files1, &files2) {
                let pair = MrPair {
                    exposure,
                    outcome,
                    n1: n1_source.lookup(&exposure.prefix)?,
                    n2: n2_source.lookup(&outcome.prefix)?,
                };
                plan.discovered += 1;
                queue_pair(params, &pair, dispatchers, &mut plan)?;
            }
        }
    }

    plan.log_summary("mr");
    Ok(plan)
}

fn queue_pair(
    params: &MrParams,
    pair: &MrPair<'_>,
    dispatchers: &mut MrDispatchers,
    plan: &mut StagePlan,
) -> Result<()> {
    ensure_dir(&pair.out_dir(&params.out_dir))?;
    let prefix = pair.out_prefix(&params.out_dir);
    let label = format!(
        "{}/{} x {}/{}",
        pair.exposure.group, pair.exposure.prefix, pair.outcome.group, pair.outcome.prefix
    );

    plan.queue_unless_complete(
        &mut dispatchers.main,
        &label,
        &ExpectedOutputs::with_suffixes(&prefix, &MAIN_SUFFIXES),
        params.force,
        || Ok(render_main(params, pair).render()),
    )?;
    plan.queue_unless_complete(
        &mut dispatchers.main,
        &label,
        &ExpectedOutputs::with_suffixes(&prefix, &LCV_SUFFIXES),
        params.force,
        || Ok(render_lcv(params, pair).render()),
    )?;
    plan.queue_unless_complete(
        &mut dispatchers.cause,
        &label,
        &ExpectedOutputs::with_suffixes(&prefix, &CAUSE_SUFFIXES),
        params.force,
        || Ok(render_cause(params, pair).render()),
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> MrParams {
        MrParams {
            in_dir: PathBuf::from("/gwa"),
            out_dir: PathBuf::from("/mr"),
            clump_dir: PathBuf::from("/clump"),
            ldscore: PathBuf::from("/params/uk10k.l2.ldscore"),
            r_scripts: None,
            ext1: "fastGWA".into(),
            ext2: "txt".into(),
            n1: SampleSizeArg::Count(54030),
            n2: SampleSizeArg::Count(100000),
            nca: None,
            pval: DEFAULT_CLUMP_PVALUE,
            env: DEFAULT_ENV.into(),
            force: false,
        }
    }

    fn file(group: &str, prefix: &str, ext: &str) -> GwaFile {
        GwaFile {
            group: group.into(),
            prefix: prefix.into(),
            path: PathBuf::from(format!("/gwa/{}/{}.{}", group, prefix, ext)),
        }
    }

    #[test]
    fn test_out_prefix_layout() {
        let f1 = file("deg_local", "lh_v1", "fastGWA");
        let f2 = file("disorders", "scz", "txt");
        let pair = MrPair {
            exposure: &f1,
            outcome: &f2,
            n1: SampleSize::total(54030),
            n2: SampleSize::total(130644),
        };
        assert_eq!(
            pair.out_prefix(Path::new("/mr")),
            PathBuf::from("/mr/disorders/scz/deg_local_lh_v1_scz")
        );
    }

    #[test]
    fn test_render_main_with_cases() {
        let f1 = file("deg_local", "lh_v1", "fastGWA");
        let f2 = file("disorders", "scz", "txt");
        let pair = MrPair {
            exposure: &f1,
            outcome: &f2,
            n1: SampleSize::total(54030),
            n2: SampleSize::with_cases(100, 40).unwrap(),
        };
        assert_eq!(
            render_main(&params(), &pair).render(),
            "Rscript mr_master.r --g1 /gwa/deg_local/lh_v1.fastGWA \
             --c1 /clump/deg_local/lh_v1_1e-03.clumped --n1 54030 \
             --g2 /gwa/disorders/scz.txt --c2 /clump/disorders/scz_1e-03.clumped \
             --n2 100 --nca 40 --nco 60 -o /mr/disorders/scz"
        );
    }

    #[test]
    fn test_render_lcv_and_cause() {
        let f1 = file("deg_local", "lh_v1", "fastGWA");
        let f2 = file("disorders", "scz", "txt");
        let pair = MrPair {
            exposure: &f1,
            outcome: &f2,
            n1: SampleSize::total(54030),
            n2: SampleSize::total(130644),
        };
        let forced = MrParams {
            force: true,
            r_scripts: Some(PathBuf::from("/opt/mr")),
            ..params()
        };
        assert_eq!(
            render_lcv(&forced, &pair).render(),
            "Rscript /opt/mr/mr_lcv.r --g1 /gwa/deg_local/lh_v1.fastGWA \
             --g2 /gwa/disorders/scz.txt --n1 54030 --n2 130644 -o /mr/disorders/scz \
             --ldsc /params/uk10k.l2.ldscore -f"
        );
        let cause = render_cause(&params(), &pair).render();
        assert!(cause.starts_with("Rscript mr_cause.r --g1"));
        assert!(!cause.contains("--n1"));
    }

    #[test]
    fn test_dispatcher_names_and_profiles() {
        let d = MrDispatchers::new(&["disorders".into(), "psych".into()], DEFAULT_ENV);
        assert_eq!(d.main.name(), "mr_disorders_psych");
        assert_eq!(d.cause.name(), "mr_cause_disorders_psych");
        assert_eq!(d.cause.profile().n_cpu, 3);
        assert_eq!(d.main.profile().env.as_deref(), Some("gentoolsr"));
    }

    #[test]
    fn test_plan_queues_missing_outputs_only() {
        let dir = tempfile::tempdir().unwrap();
        let gwa = dir.path().join("gwa");
        std::fs::create_dir_all(gwa.join("idp")).unwrap();
        std::fs::create_dir_all(gwa.join("dis")).unwrap();
        std::fs::write(gwa.join("idp/deg.fastGWA"), "").unwrap();
        std::fs::write(gwa.join("dis/scz.txt"), "").unwrap();

        let mut p = params();
        p.in_dir = gwa;
        p.out_dir = dir.path().join("mr");
        let p1 = vec!["idp".to_string()];
        let p2 = vec!["dis".to_string()];

        // LCV already finished
        let pair_dir = p.out_dir.join("dis/scz");
        std::fs::create_dir_all(&pair_dir).unwrap();
        std::fs::write(pair_dir.join("idp_deg_scz_mr_lcv_results.txt"), "").unwrap();

        let mut d = MrDispatchers::new(&p2, &p.env);
        let plan = plan(&p, &p1, &p2, &mut d).unwrap();
        assert_eq!(plan.discovered, 1);
        assert_eq!(plan.queued, 2);
        assert_eq!(plan.skipped, 1);
        assert_eq!(d.main.len(), 1);
        assert_eq!(d.cause.len(), 1);
        assert!(d.main.jobs()[0].command().contains("mr_master.r"));
    }

    #[test]
    fn test_plan_fails_on_missing_table_entry() {
        let dir = tempfile::tempdir().unwrap();
        let gwa = dir.path().join("gwa");
        std::fs::create_dir_all(gwa.join("idp")).unwrap();
        std::fs::create_dir_all(gwa.join("dis")).unwrap();
        std::fs::write(gwa.join("idp/deg.fastGWA"), "").unwrap();
        std::fs::write(gwa.join("dis/scz.txt"), "").unwrap();
        let table = dir.path().join("n2.txt");
        std::fs::write(&table, "pheno\tn\nbip\t413466\n").unwrap();

        let mut p = params();
        p.in_dir = gwa;
        p.out_dir = dir.path().join("mr");
        p.n2 = SampleSizeArg::Table(table);
        let p1 = vec!["idp".to_string()];
        let p2 = vec!["dis".to_string()];

        let mut d = MrDispatchers::new(&p2, &p.env);
        assert!(plan(&p, &p1, &p2, &mut d).is_err());
        assert!(d.main.is_empty());
    }
}
