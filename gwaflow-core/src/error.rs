//! Driver-level error type.
//!
//! Each variant is one failure class a driver run can end with, so callers
//! can tell a bad input apart from a scheduler rejection.

use std::path::PathBuf;

use gwaflow_io::InputError;
use thiserror::Error;

use crate::config::ConfigError;
use crate::dispatch::DispatchError;
use crate::scheduler::SubmitError;

#[derive(Error, Debug)]
pub enum DriverError {
    /// Malformed or missing input; raised before anything is submitted.
    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    /// The scheduler refused a batch. Not retried.
    #[error(transparent)]
    Submit(#[from] SubmitError),

    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("redundancy analysis failed: {0}")]
    Analysis(String),
}

pub type Result<T> = std::result::Result<T, DriverError>;
