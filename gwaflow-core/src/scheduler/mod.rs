//! Scheduler submission interface.
//!
//! The pipeline never polls job state: a submission either returns a
//! handle or fails outright.

pub mod recording;
pub mod slurm;

use std::path::PathBuf;

use thiserror::Error;

use crate::dispatch::{BatchLimits, ResourceProfile};

pub use recording::RecordingScheduler;
pub use slurm::SlurmScheduler;

#[derive(Error, Debug)]
pub enum SubmitError {
    #[error("invalid resource profile: {0}")]
    InvalidProfile(String),

    #[error("failed to write job script {path}: {source}")]
    Script {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to run '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("scheduler rejected '{name}' (exit status {status}): {stderr}")]
    Rejected {
        name: String,
        status: String,
        stderr: String,
    },

    #[error("could not read a job id from scheduler output {0:?}")]
    NoJobId(String),
}

/// One array submission: every task runs its commands in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrayJob {
    pub name: String,
    pub profile: ResourceProfile,
    pub tasks: Vec<Vec<String>>,
}

impl ArrayJob {
    pub fn n_commands(&self) -> usize {
        self.tasks.iter().map(Vec::len).sum()
    }
}

/// Acknowledgment of one array submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionRecord {
    pub name: String,
    pub job_id: String,
    pub n_tasks: usize,
    pub n_commands: usize,
}

/// A batch system that accepts array jobs.
pub trait Scheduler {
    /// Size limits for batches sent to this scheduler.
    fn limits(&self) -> BatchLimits;

    /// Human-readable form of what `submit` would send.
    fn render(&self, job: &ArrayJob) -> String;

    /// Submit one array job. Must not block on job completion.
    fn submit(&mut self, job: &ArrayJob) -> Result<SubmissionRecord, SubmitError>;
}
