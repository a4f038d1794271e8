//! In-memory scheduler that records submissions.

use super::{ArrayJob, Scheduler, SubmissionRecord, SubmitError};
use crate::dispatch::BatchLimits;

#[derive(Debug, Default)]
pub struct RecordingScheduler {
    limits: BatchLimits,
    submitted: Vec<ArrayJob>,
}

impl RecordingScheduler {
    pub fn new(limits: BatchLimits) -> Self {
        Self {
            limits,
            submitted: Vec::new(),
        }
    }

    pub fn submitted(&self) -> &[ArrayJob] {
        &self.submitted
    }

    /// Every command submitted so far, in submission order.
    pub fn commands(&self) -> Vec<&str> {
        self.submitted
            .iter()
            .flat_map(|job| job.tasks.iter().flatten())
            .map(String::as_str)
            .collect()
    }
}

impl Scheduler for RecordingScheduler {
    fn limits(&self) -> BatchLimits {
        self.limits
    }

    fn render(&self, job: &ArrayJob) -> String {
        let mut out = format!(
            "# {} ({} tasks, {} cpu, {} min)\n",
            job.name,
            job.tasks.len(),
            job.profile.n_cpu,
            job.profile.timeout_minutes
        );
        for (i, task) in job.tasks.iter().enumerate() {
            for cmd in task {
                out.push_str(&format!("[{}] {}\n", i, cmd));
            }
        }
        out
    }

    fn submit(&mut self, job: &ArrayJob) -> Result<SubmissionRecord, SubmitError> {
        job.profile.validate()?;
        self.submitted.push(job.clone());
        Ok(SubmissionRecord {
            name: job.name.clone(),
            job_id: format!("dry-{}", self.submitted.len()),
            n_tasks: job.tasks.len(),
            n_commands: job.n_commands(),
        })
    }
}
