//! Pipeline configuration.
//!
//! Cluster-specific locations live here instead of in driver code. The
//! binary picks the file (`--config`, then `$GWAFLOW_CONFIG`) and applies
//! defaults; the library only sees the resolved struct.
//!
//! ```toml
//! [paths]
//! scripts = "/home/user/scripts"
//! ldsc = "/home/user/ldsc"
//! plink = "/opt/plink2"
//!
//! [scheduler]
//! max_array_size = 1000
//! account = "GENETICS-SL2-CPU"
//! ```

use std::path::{Path, PathBuf};

use gwaflow_io::paths::{canonicalize, canonicalize_opt};
use gwaflow_io::InputError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dispatch::BatchLimits;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("'{0}' is not configured; set it in [paths] or pass it on the command line")]
    MissingPath(&'static str),

    #[error(transparent)]
    Canonicalize(#[from] InputError),
}

/// Named path roots used when rendering commands.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathRoots {
    /// Directory holding `pymaster.sh` / `ldsc_master.sh` and the Python
    /// per-trait scripts.
    pub scripts: Option<PathBuf>,
    /// Directory holding the MR R scripts; bare names are used when unset.
    pub r_scripts: Option<PathBuf>,
    /// LDSC installation (`{ldsc}/baseline/` holds the reference scores).
    pub ldsc: Option<PathBuf>,
    /// LD scores for LCV regression.
    pub ldscore: Option<PathBuf>,
    /// plink2 executable; `plink2` on `PATH` when unset.
    pub plink: Option<PathBuf>,
}

impl PathRoots {
    /// Canonicalize every configured root.
    pub fn canonicalized(self) -> Result<Self, InputError> {
        Ok(Self {
            scripts: canonicalize_opt(self.scripts.as_deref())?,
            r_scripts: canonicalize_opt(self.r_scripts.as_deref())?,
            ldsc: canonicalize_opt(self.ldsc.as_deref())?,
            ldscore: canonicalize_opt(self.ldscore.as_deref())?,
            plink: canonicalize_opt(self.plink.as_deref())?,
        })
    }
}

/// Pick the command-line value over the configured one, or fail naming
/// the missing root.
pub fn require_path(
    cli: Option<&Path>,
    configured: Option<&Path>,
    name: &'static str,
) -> Result<PathBuf, ConfigError> {
    match cli {
        Some(p) => Ok(canonicalize(p)?),
        None => configured
            .map(Path::to_path_buf)
            .ok_or(ConfigError::MissingPath(name)),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SchedulerConfig {
    /// Largest array a single submission may carry.
    pub max_array_size: usize,
    /// Commands run back to back inside one array element.
    pub commands_per_task: usize,
    /// Where generated job scripts are written.
    pub staging_dir: PathBuf,
    /// Where array elements write stdout/stderr.
    pub log_dir: PathBuf,
    pub account: Option<String>,
    /// Partition for long-running stages.
    pub long_partition: Option<String>,
    /// Submission program.
    pub sbatch: String,
    /// Prefix used to activate a named environment, e.g.
    /// `source activate` or `conda activate`.
    pub conda_activate: String,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_array_size: 1000,
            commands_per_task: 1,
            staging_dir: PathBuf::from(".gwaflow/jobs"),
            log_dir: PathBuf::from(".gwaflow/logs"),
            account: None,
            long_partition: None,
            sbatch: "sbatch".to_string(),
            conda_activate: "source activate".to_string(),
        }
    }
}

impl SchedulerConfig {
    pub fn limits(&self) -> BatchLimits {
        BatchLimits {
            max_array_size: self.max_array_size,
            commands_per_task: self.commands_per_task,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    pub paths: PathRoots,
    pub scheduler: SchedulerConfig,
}

impl PipelineConfig {
    /// Load a TOML config file and canonicalize its path fields.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: PipelineConfig =
            toml::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        config.canonicalized()
    }

    /// Canonicalize every path-valued field.
    pub fn canonicalized(self) -> Result<Self, ConfigError> {
        let scheduler = SchedulerConfig {
            staging_dir: canonicalize(&self.scheduler.staging_dir)?,
            log_dir: canonicalize(&self.scheduler.log_dir)?,
            ..self.scheduler
        };
        Ok(Self {
            paths: self.paths.canonicalized()?,
            scheduler,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.scheduler.max_array_size, 1000);
        assert_eq!(config.scheduler.commands_per_task, 1);
        assert!(config.paths.scripts.is_none());
    }

    #[test]
    fn test_load_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gwaflow.toml");
        std::fs::write(
            &path,
            format!(
                "[paths]\nscripts = \"{}\"\n\n[scheduler]\nmax_array_size = 500\naccount = \"LAB-CPU\"\n",
                dir.path().display()
            ),
        )
        .unwrap();

        let config = PipelineConfig::load(&path).unwrap();
        assert_eq!(
            config.paths.scripts,
            Some(std::fs::canonicalize(dir.path()).unwrap())
        );
        assert_eq!(config.scheduler.max_array_size, 500);
        assert_eq!(config.scheduler.account.as_deref(), Some("LAB-CPU"));
        assert_eq!(config.scheduler.sbatch, "sbatch");
        assert!(config.scheduler.staging_dir.is_absolute());
    }

    #[test]
    fn test_unknown_key_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gwaflow.toml");
        std::fs::write(&path, "[scheduler]\nmax_arrray_size = 5\n").unwrap();
        assert!(matches!(
            PipelineConfig::load(&path).unwrap_err(),
            ConfigError::Parse { .. }
        ));
    }

    #[test]
    fn test_require_path() {
        let err = require_path(None, None, "scripts").unwrap_err();
        assert!(matches!(err, ConfigError::MissingPath("scripts")));
        let configured = PathBuf::from("/opt/scripts");
        assert_eq!(
            require_path(None, Some(&configured), "scripts").unwrap(),
            configured
        );
    }
}
