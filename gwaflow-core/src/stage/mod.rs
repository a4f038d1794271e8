//! Pipeline stages.
//!
//! Every stage follows the same shape: discover work items, drop the ones
//! whose expected outputs already exist, render a command for the rest
//! and queue it on the stage's dispatcher(s). Planning never submits;
//! the caller decides between `submit` and `debug` afterwards.

pub mod finemap;
pub mod heritability;
pub mod mr;
pub mod prs;

use gwaflow_io::{is_complete, DiscoveryWarning, ExpectedOutputs};
use tracing::{debug, info};

use crate::dispatch::Dispatcher;
use crate::error::Result;

/// Outcome of planning one stage.
#[derive(Debug, Clone, Default)]
pub struct StagePlan {
    /// Work items considered.
    pub discovered: usize,
    /// Commands queued.
    pub queued: usize,
    /// Commands skipped because their outputs exist.
    pub skipped: usize,
    pub warnings: Vec<DiscoveryWarning>,
}

impl StagePlan {
    /// Queue `command` unless `expected` is already satisfied.
    ///
    /// Returns whether the command was queued.
    pub(crate) fn queue_unless_complete(
        &mut self,
        dispatcher: &mut Dispatcher,
        label: &str,
        expected: &ExpectedOutputs,
        force: bool,
        command: impl FnOnce() -> Result<String>,
    ) -> Result<bool> {
        if is_complete(expected, force) {
            debug!("{}: outputs present, skipping", label);
            self.skipped += 1;
            return Ok(false);
        }
        let queued = dispatcher.add(command()?)?;
        if queued {
            debug!("{}: queued on {}", label, dispatcher.name());
            self.queued += 1;
        }
        Ok(queued)
    }

    pub(crate) fn log_summary(&self, stage: &str) {
        info!(
            "{}: {} item(s) discovered, {} command(s) queued, {} skipped, {} warning(s)",
            stage,
            self.discovered,
            self.queued,
            self.skipped,
            self.warnings.len()
        );
    }
}
