//! Analysis queue port - hands a created analysis to background execution.
//!
//! Submission is synchronous and non-blocking. A full queue is reported
//! immediately with `QUEUE_FULL` instead of making the caller wait.

use crate::domain::foundation::{AnalysisId, DomainError};

/// One unit of background work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisJob {
    pub analysis_id: AnalysisId,
}

impl AnalysisJob {
    pub fn new(analysis_id: AnalysisId) -> Self {
        Self { analysis_id }
    }
}

/// Port for scheduling analyses.
pub trait AnalysisQueue: Send + Sync {
    /// Enqueue a job without waiting.
    ///
    /// # Errors
    ///
    /// - `QueueFull` if the queue has no free slot
    /// - `Cancelled` if the queue is shutting down
    fn submit(&self, job: AnalysisJob) -> Result<(), DomainError>;

    /// Request cancellation of a queued or running analysis.
    ///
    /// Returns `false` if the analysis is unknown to this queue.
    fn cancel(&self, analysis_id: &AnalysisId) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analysis_queue_is_object_safe() {
        fn _accepts_dyn(_queue: &dyn AnalysisQueue) {}
    }
}
