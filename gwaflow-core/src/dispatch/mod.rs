//! The array submitter.
//!
//! A [`Dispatcher`] owns one batch: a name, one resource profile, and the
//! commands queued for it. Drivers needing several resource shapes hold
//! one dispatcher per shape. The batch is consumed exactly once, either by
//! [`Dispatcher::submit`] or by [`Dispatcher::debug`].

pub mod chunk;

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::scheduler::{ArrayJob, Scheduler, SubmissionRecord, SubmitError};

pub use chunk::{plan_array_jobs, BatchLimits};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum DispatchError {
    #[error("batch '{batch}': refusing empty command")]
    EmptyCommand { batch: String },

    #[error("batch '{batch}': command spans multiple lines: {command:?}")]
    MultiLineCommand { batch: String, command: String },
}

/// Scheduler-facing resource request shared by every job in a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceProfile {
    pub n_cpu: u32,
    /// Wall-clock limit per array element, in minutes.
    pub timeout_minutes: u32,
    /// Named conda environment activated before the commands run.
    pub env: Option<String>,
    pub partition: Option<String>,
}

impl ResourceProfile {
    pub fn new(n_cpu: u32, timeout_minutes: u32) -> Self {
        Self {
            n_cpu,
            timeout_minutes,
            env: None,
            partition: None,
        }
    }

    pub fn with_env(mut self, env: impl Into<String>) -> Self {
        self.env = Some(env.into());
        self
    }

    pub fn with_partition(mut self, partition: Option<String>) -> Self {
        self.partition = partition;
        self
    }

    /// Reject requests no scheduler would accept.
    pub fn validate(&self) -> Result<(), SubmitError> {
        if self.n_cpu == 0 {
            return Err(SubmitError::InvalidProfile("n_cpu must be at least 1".into()));
        }
        if self.timeout_minutes == 0 {
            return Err(SubmitError::InvalidProfile(
                "timeout must be at least 1 minute".into(),
            ));
        }
        if let Some(env) = &self.env {
            if env.trim().is_empty() || env.contains(char::is_whitespace) {
                return Err(SubmitError::InvalidProfile(format!(
                    "invalid environment name {:?}",
                    env
                )));
            }
        }
        Ok(())
    }
}

/// One rendered shell command.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JobSpec {
    command: String,
}

impl JobSpec {
    pub fn command(&self) -> &str {
        &self.command
    }
}

/// Accumulates the commands of one batch.
#[derive(Debug)]
pub struct Dispatcher {
    name: String,
    profile: ResourceProfile,
    jobs: Vec<JobSpec>,
    seen: HashSet<String>,
}

impl Dispatcher {
    pub fn new(name: impl Into<String>, profile: ResourceProfile) -> Self {
        Self {
            name: name.into(),
            profile,
            jobs: Vec::new(),
            seen: HashSet::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn profile(&self) -> &ResourceProfile {
        &self.profile
    }

    pub fn jobs(&self) -> &[JobSpec] {
        &self.jobs
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Queue a command. Returns `false` when an identical command is
    /// already queued in this batch.
    pub fn add(&mut self, command: impl Into<String>) -> Result<bool, DispatchError> {
        let command = command.into().trim().to_string();
        if command.is_empty() {
            return Err(DispatchError::EmptyCommand {
                batch: self.name.clone(),
            });
        }
        if command.contains('\n') || command.contains('\r') {
            return Err(DispatchError::MultiLineCommand {
                batch: self.name.clone(),
                command,
            });
        }
        if !self.seen.insert(command.clone()) {
            debug!("{}: duplicate command ignored: {}", self.name, command);
            return Ok(false);
        }
        self.jobs.push(JobSpec { command });
        Ok(true)
    }

    /// Array jobs this batch would become under `limits`.
    pub fn plan(&self, limits: BatchLimits) -> Vec<ArrayJob> {
        let commands: Vec<String> = self.jobs.iter().map(|j| j.command.clone()).collect();
        plan_array_jobs(&self.name, &self.profile, commands, limits)
    }

    /// Flush the batch to the scheduler.
    ///
    /// An empty batch submits nothing. Submissions are not retried; the
    /// first failure aborts the remaining chunks.
    pub fn submit<S: Scheduler + ?Sized>(
        self,
        scheduler: &mut S,
    ) -> Result<Vec<SubmissionRecord>, SubmitError> {
        if self.is_empty() {
            info!("{}: nothing to submit", self.name);
            return Ok(Vec::new());
        }
        self.profile.validate()?;

        let jobs = self.plan(scheduler.limits());
        info!(
            "{}: submitting {} commands as {} array job(s)",
            self.name,
            self.jobs.len(),
            jobs.len()
        );
        let mut records = Vec::with_capacity(jobs.len());
        for job in &jobs {
            let record = scheduler.submit(job)?;
            info!(
                "{}: submitted job {} ({} tasks)",
                record.name, record.job_id, record.n_tasks
            );
            records.push(record);
        }
        Ok(records)
    }

    /// Render what `submit` would send, without submitting.
    pub fn debug<S: Scheduler + ?Sized>(self, scheduler: &S) -> String {
        if self.is_empty() {
            return format!("# {}: nothing to submit\n", self.name);
        }
        self.plan(scheduler.limits())
            .iter()
            .map(|job| scheduler.render(job))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::RecordingScheduler;

    fn profile() -> ResourceProfile {
        ResourceProfile::new(2, 30)
    }

    #[test]
    fn test_add_rejects_malformed() {
        let mut d = Dispatcher::new("finemap", profile());
        assert!(matches!(
            d.add("   "),
            Err(DispatchError::EmptyCommand { .. })
        ));
        assert!(matches!(
            d.add("echo a\necho b"),
            Err(DispatchError::MultiLineCommand { .. })
        ));
        assert!(d.is_empty());
    }

    #[test]
    fn test_add_deduplicates() {
        let mut d = Dispatcher::new("finemap", profile());
        assert!(d.add("echo hdl").unwrap());
        assert!(!d.add("echo hdl").unwrap());
        assert!(d.add("echo ldl").unwrap());
        assert_eq!(d.len(), 2);
        assert_eq!(d.jobs()[1].command(), "echo ldl");
    }

    #[test]
    fn test_empty_submit_is_noop() {
        let mut sched = RecordingScheduler::new(BatchLimits::default());
        let d = Dispatcher::new("finemap", profile());
        let records = d.submit(&mut sched).unwrap();
        assert!(records.is_empty());
        assert!(sched.submitted().is_empty());
    }

    #[test]
    fn test_submit_records_one_job() {
        let mut sched = RecordingScheduler::new(BatchLimits::default());
        let mut d = Dispatcher::new("finemap", profile());
        d.add("echo hdl").unwrap();
        d.add("echo ldl").unwrap();
        let records = d.submit(&mut sched).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "finemap");
        assert_eq!(records[0].n_tasks, 2);
        assert_eq!(sched.submitted()[0].profile, profile());
    }

    #[test]
    fn test_invalid_profile_submits_nothing() {
        let mut sched = RecordingScheduler::new(BatchLimits::default());
        let mut d = Dispatcher::new("bad", ResourceProfile::new(0, 30));
        d.add("echo x").unwrap();
        assert!(matches!(
            d.submit(&mut sched),
            Err(SubmitError::InvalidProfile(_))
        ));
        assert!(sched.submitted().is_empty());
    }

    #[test]
    fn test_debug_renders_without_submitting() {
        let sched = RecordingScheduler::new(BatchLimits::default());
        let mut d = Dispatcher::new("finemap", profile());
        d.add("echo hdl").unwrap();
        let text = d.debug(&sched);
        assert!(text.contains("echo hdl"));
        assert!(sched.submitted().is_empty());
    }
}
