//! Analysis handlers - trigger, rerun and status queries.

mod dispatch;
mod get_analysis;
mod list_analyses;
mod rerun_analysis;
mod start_analysis;

pub use get_analysis::{AnalysisView, GetAnalysisHandler};
pub use list_analyses::ListAnalysesHandler;
pub use rerun_analysis::{RerunAnalysisCommand, RerunAnalysisHandler};
pub use start_analysis::{StartAnalysisCommand, StartAnalysisHandler};
