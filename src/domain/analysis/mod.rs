//! Analysis module - the lifecycle record of one pipeline run.

#[allow(clippy::module_inception)]
mod analysis;
mod errors;
mod rerun_policy;
mod status;

pub use analysis::Analysis;
pub use errors::AnalysisError;
pub use rerun_policy::RerunConstraintPolicy;
pub use status::AnalysisStatus;
