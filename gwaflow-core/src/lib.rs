//! gwaflow-core: batch orchestration for post-GWAS analyses.
//!
//! Renders per-item shell commands for each pipeline stage, skips items
//! whose outputs already exist, and hands the rest to a cluster scheduler
//! as array jobs. Also hosts the local phenotype-redundancy analysis.

pub mod command;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod redundancy;
pub mod scheduler;
pub mod stage;

pub use config::PipelineConfig;
pub use dispatch::{Dispatcher, ResourceProfile};
pub use error::{DriverError, Result};
pub use scheduler::{RecordingScheduler, Scheduler, SlurmScheduler};
pub use stage::StagePlan;
