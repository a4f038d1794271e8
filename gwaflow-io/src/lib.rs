//! gwaflow-io: filesystem side of the gwaflow pipeline.
//!
//! Scans input namespaces for work, checks expected outputs, and parses
//! the small tabular inputs drivers need (sample sizes, GWA lists,
//! phenotype tables, PLINK reference locations).

pub mod bed;
pub mod completion;
pub mod discovery;
pub mod error;
pub mod format;
pub mod gwa_list;
pub mod h2_log;
pub mod paths;
pub mod pattern;
pub mod phenotype;
pub mod sample;
pub mod sample_size;

pub use completion::{is_complete, ExpectedOutputs};
pub use discovery::{DiscoveryWarning, GwaFile, Scan};
pub use error::InputError;
