//! Single-trait fine-mapping (PolyFun + SuSiE).
//!
//! One job per summary-statistics file:
//! `{in}/{group}/{prefix}.fastGWA` -> `{out}/{group}/{prefix}.finemap.summary`.

use std::path::{Path, PathBuf};

use gwaflow_io::discovery::{discover, resolve_groups};
use gwaflow_io::paths::{canonicalize, ensure_dir};
use gwaflow_io::{format, ExpectedOutputs, GwaFile, InputError};
use tracing::info;

use super::StagePlan;
use crate::command::{CommandLine, FORCE_FLAG};
use crate::dispatch::{Dispatcher, ResourceProfile};
use crate::error::Result;

/// Genome-wide threshold used when none is given.
pub const DEFAULT_PVALUE: f64 = 3.1076e-11;

pub const SUMMARY_SUFFIX: &str = ".finemap.summary";

#[derive(Debug, Clone)]
pub struct FinemapParams {
    pub in_dir: PathBuf,
    pub out_dir: PathBuf,
    /// Directory of reference PLINK binaries for LD.
    pub bfile: PathBuf,
    /// Directory holding `pymaster.sh` and `finemap_by_trait.py`.
    pub scripts: PathBuf,
    pub pvalue: f64,
    pub ext: String,
    pub force: bool,
}

impl FinemapParams {
    /// Build parameters, canonicalizing every path.
    pub fn new(
        in_dir: &Path,
        out_dir: &Path,
        bfile: &Path,
        scripts: &Path,
        pvalue: f64,
        force: bool,
    ) -> std::result::Result<Self, InputError> {
        Ok(Self {
            in_dir: canonicalize(in_dir)?,
            out_dir: canonicalize(out_dir)?,
            bfile: canonicalize(bfile)?,
            scripts: canonicalize(scripts)?,
            pvalue,
            ext: "fastGWA".to_string(),
            force,
        })
    }
}

pub fn dispatcher() -> Dispatcher {
    Dispatcher::new("finemap", ResourceProfile::new(2, 30))
}

pub fn expected_outputs(out_dir: &Path, prefix: &str) -> ExpectedOutputs {
    ExpectedOutputs::with_suffixes(&out_dir.join(prefix), &[SUMMARY_SUFFIX])
}

pub fn render(params: &FinemapParams, file: &GwaFile) -> CommandLine {
    let file_name = file
        .path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    CommandLine::new("bash")
        .path(&params.scripts.join("pymaster.sh"))
        .arg("finemap_by_trait.py")
        .arg(&file.group)
        .opt("-i", file_name)
        .opt_path("-d", &params.in_dir)
        .opt_path("-o", &params.out_dir)
        .opt("-p", format::pvalue(params.pvalue))
        .opt_path("-b", &params.bfile)
        .flag_if(FORCE_FLAG, params.force)
}

/// Queue fine-mapping for every incomplete file in `groups` (all groups
/// when empty).
pub fn plan(
    params: &FinemapParams,
    groups: &[String],
    dispatcher: &mut Dispatcher,
) -> Result<StagePlan> {
    ensure_dir(&params.out_dir)?;
    let groups = resolve_groups(&params.in_dir, groups)?;
    let scan = discover(&params.in_dir, &groups, &params.ext)?;
    info!(
        "finemap: {} file(s) in {} group(s)",
        scan.files.len(),
        groups.len()
    );

    let mut plan = StagePlan {
        discovered: scan.files.len(),
        warnings: scan.warnings.clone(),
        ..StagePlan::default()
    };

    for file in &scan.files {
        let group_out = params.out_dir.join(&file.group);
        ensure_dir(&group_out)?;
        let label = format!("{}/{}", file.group, file.prefix);
        plan.queue_unless_complete(
            dispatcher,
            &label,
            &expected_outputs(&group_out, &file.prefix),
            params.force,
            || Ok(render(params, file).render()),
        )?;
    }

    plan.log_summary("finemap");
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_matches_script_interface() {
        let params = FinemapParams {
            in_dir: PathBuf::from("/gwa"),
            out_dir: PathBuf::from("/finemap"),
            bfile: PathBuf::from("/params/bed"),
            scripts: PathBuf::from("/scripts"),
            pvalue: DEFAULT_PVALUE,
            ext: "fastGWA".into(),
            force: false,
        };
        let file = GwaFile {
            group: "lipids".into(),
            prefix: "hdl".into(),
            path: PathBuf::from("/gwa/lipids/hdl.fastGWA"),
        };
        assert_eq!(
            render(&params, &file).render(),
            "bash /scripts/pymaster.sh finemap_by_trait.py lipids -i hdl.fastGWA \
             -d /gwa -o /finemap -p 3.1076e-11 -b /params/bed"
        );

        let forced = FinemapParams {
            force: true,
            ..params
        };
        assert!(render(&forced, &file).render().ends_with(" -f"));
    }

    #[test]
    fn test_expected_output_path() {
        let expected = expected_outputs(Path::new("/finemap/lipids"), "hdl");
        assert_eq!(
            expected.paths(),
            &[PathBuf::from("/finemap/lipids/hdl.finemap.summary")]
        );
    }
}
