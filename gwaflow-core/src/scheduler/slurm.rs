//! Slurm array-job submission via `sbatch`.
//!
//! Each array job becomes one batch script:
//! ```text
//! #!/bin/bash
//! #SBATCH --job-name=finemap
//! #SBATCH --cpus-per-task=2
//! #SBATCH --time=00:30:00
//! #SBATCH --array=0-1
//! ...
//! case "$SLURM_ARRAY_TASK_ID" in
//!   0)
//!     bash /scripts/pymaster.sh finemap_by_trait.py ...
//!     ;;
//!   1)
//!     ...
//! esac
//! ```

use std::fmt::Write as _;
use std::path::PathBuf;
use std::process::Command;

use tracing::{debug, info};

use super::{ArrayJob, Scheduler, SubmissionRecord, SubmitError};
use crate::config::SchedulerConfig;
use crate::dispatch::BatchLimits;

#[derive(Debug, Clone)]
pub struct SlurmScheduler {
    config: SchedulerConfig,
}

impl SlurmScheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        Self { config }
    }

    pub fn script_path(&self, job: &ArrayJob) -> PathBuf {
        self.config.staging_dir.join(format!("{}.sh", job.name))
    }

    /// The sbatch script for `job`.
    pub fn script(&self, job: &ArrayJob) -> String {
        let mut s = String::new();
        let log = self.config.log_dir.display();
        let _ = writeln!(s, "#!/bin/bash");
        let _ = writeln!(s, "#SBATCH --job-name={}", job.name);
        let _ = writeln!(s, "#SBATCH --cpus-per-task={}", job.profile.n_cpu);
        let _ = writeln!(s, "#SBATCH --time={}", format_walltime(job.profile.timeout_minutes));
        let _ = writeln!(s, "#SBATCH --array=0-{}", job.tasks.len().saturating_sub(1));
        let _ = writeln!(s, "#SBATCH --output={}/{}_%A_%a.out", log, job.name);
        let _ = writeln!(s, "#SBATCH --error={}/{}_%A_%a.err", log, job.name);
        if let Some(account) = &self.config.account {
            let _ = writeln!(s, "#SBATCH --account={}", account);
        }
        if let Some(partition) = &job.profile.partition {
            let _ = writeln!(s, "#SBATCH --partition={}", partition);
        }
        s.push('\n');
        if let Some(env) = &job.profile.env {
            let _ = writeln!(s, "{} {}", self.config.conda_activate, env);
            s.push('\n');
        }
        let _ = writeln!(s, "case \"$SLURM_ARRAY_TASK_ID\" in");
        for (i, task) in job.tasks.iter().enumerate() {
            let _ = writeln!(s, "  {})", i);
            for cmd in task {
                let _ = writeln!(s, "    {}", cmd);
            }
            let _ = writeln!(s, "    ;;");
        }
        let _ = writeln!(s, "esac");
        s
    }
}

/// Slurm `--time` value: `HH:MM:00`, or `D-HH:MM:00` from one day up.
pub fn format_walltime(minutes: u32) -> String {
    let days = minutes / (24 * 60);
    let hours = (minutes / 60) % 24;
    let mins = minutes % 60;
    if days > 0 {
        format!("{}-{:02}:{:02}:00", days, hours, mins)
    } else {
        format!("{:02}:{:02}:00", hours, mins)
    }
}

/// Job id from `sbatch --parsable` output (`jobid` or `jobid;cluster`).
pub fn parse_job_id(stdout: &str) -> Option<String> {
    let first = stdout.lines().map(str::trim).find(|l| !l.is_empty())?;
    let id = first.split(';').next()?.trim();
    if !id.is_empty() && id.chars().all(|c| c.is_ascii_digit()) {
        Some(id.to_string())
    } else {
        None
    }
}

impl Scheduler for SlurmScheduler {
    fn limits(&self) -> BatchLimits {
        self.config.limits()
    }

    fn render(&self, job: &ArrayJob) -> String {
        format!("# {}\n{}", self.script_path(job).display(), self.script(job))
    }

    fn submit(&mut self, job: &ArrayJob) -> Result<SubmissionRecord, SubmitError> {
        job.profile.validate()?;

        for dir in [&self.config.staging_dir, &self.config.log_dir] {
            std::fs::create_dir_all(dir).map_err(|source| SubmitError::Script {
                path: dir.clone(),
                source,
            })?;
        }
        let path = self.script_path(job);
        std::fs::write(&path, self.script(job)).map_err(|source| SubmitError::Script {
            path: path.clone(),
            source,
        })?;
        debug!("Wrote {}", path.display());

        let output = Command::new(&self.config.sbatch)
            .arg("--parsable")
            .arg(&path)
            .output()
            .map_err(|source| SubmitError::Spawn {
                program: self.config.sbatch.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(SubmitError::Rejected {
                name: job.name.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let job_id = parse_job_id(&stdout).ok_or_else(|| SubmitError::NoJobId(stdout.to_string()))?;
        info!("sbatch accepted {} as {}", job.name, job_id);

        Ok(SubmissionRecord {
            name: job.name.clone(),
            job_id,
            n_tasks: job.tasks.len(),
            n_commands: job.n_commands(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::ResourceProfile;

    fn job() -> ArrayJob {
        ArrayJob {
            name: "mr_cause_disorders".into(),
            profile: ResourceProfile::new(3, 20).with_env("gentoolsr"),
            tasks: vec![vec!["echo a".into()], vec!["echo b".into(), "echo c".into()]],
        }
    }

    #[test]
    fn test_walltime() {
        assert_eq!(format_walltime(20), "00:20:00");
        assert_eq!(format_walltime(90), "01:30:00");
        assert_eq!(format_walltime(24 * 60 + 5), "1-00:05:00");
    }

    #[test]
    fn test_parse_job_id() {
        assert_eq!(parse_job_id("123456\n"), Some("123456".into()));
        assert_eq!(parse_job_id("123456;cluster\n"), Some("123456".into()));
        assert_eq!(parse_job_id("sbatch: error\n"), None);
        assert_eq!(parse_job_id(""), None);
    }

    #[test]
    fn test_script_layout() {
        let config = SchedulerConfig {
            account: Some("LAB-CPU".into()),
            log_dir: PathBuf::from("/logs"),
            ..SchedulerConfig::default()
        };
        let script = SlurmScheduler::new(config).script(&job());
        assert!(script.starts_with("#!/bin/bash\n"));
        assert!(script.contains("#SBATCH --cpus-per-task=3\n"));
        assert!(script.contains("#SBATCH --time=00:20:00\n"));
        assert!(script.contains("#SBATCH --array=0-1\n"));
        assert!(script.contains("#SBATCH --account=LAB-CPU\n"));
        assert!(script.contains("#SBATCH --output=/logs/mr_cause_disorders_%A_%a.out\n"));
        assert!(script.contains("source activate gentoolsr\n"));
        assert!(script.contains("  1)\n    echo b\n    echo c\n    ;;\n"));
        assert!(!script.contains("--partition"));
    }

    #[cfg(unix)]
    #[test]
    fn test_submit_with_fake_sbatch() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let fake = dir.path().join("sbatch");
        std::fs::write(&fake, "#!/bin/sh\necho '4242;cluster'\n").unwrap();
        std::fs::set_permissions(&fake, std::fs::Permissions::from_mode(0o755)).unwrap();

        let config = SchedulerConfig {
            staging_dir: dir.path().join("jobs"),
            log_dir: dir.path().join("logs"),
            sbatch: fake.display().to_string(),
            ..SchedulerConfig::default()
        };
        let mut sched = SlurmScheduler::new(config);
        let record = sched.submit(&job()).unwrap();
        assert_eq!(record.job_id, "4242");
        assert_eq!(record.n_tasks, 2);
        assert_eq!(record.n_commands, 3);
        assert!(dir.path().join("jobs/mr_cause_disorders.sh").is_file());
        assert!(dir.path().join("logs").is_dir());
    }

    #[cfg(unix)]
    #[test]
    fn test_rejected_submission() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let fake = dir.path().join("sbatch");
        std::fs::write(&fake, "#!/bin/sh\necho 'invalid account' >&2\nexit 1\n").unwrap();
        std::fs::set_permissions(&fake, std::fs::Permissions::from_mode(0o755)).unwrap();

        let config = SchedulerConfig {
            staging_dir: dir.path().join("jobs"),
            log_dir: dir.path().join("logs"),
            sbatch: fake.display().to_string(),
            ..SchedulerConfig::default()
        };
        let err = SlurmScheduler::new(config).submit(&job()).unwrap_err();
        match err {
            SubmitError::Rejected { stderr, .. } => assert_eq!(stderr, "invalid account"),
            other => panic!("unexpected error: {}", other),
        }
    }
}
