//! StartAnalysisHandler - the trigger that creates and schedules an analysis.

use std::sync::Arc;

use crate::domain::analysis::{Analysis, AnalysisError};
use crate::domain::foundation::{AnalysisId, ConstraintId, DocumentId};
use crate::ports::{AnalysisQueue, AnalysisRepository};

use super::dispatch::create_and_dispatch;

/// Command to start an analysis.
#[derive(Debug, Clone)]
pub struct StartAnalysisCommand {
    pub document_id: DocumentId,
    pub constraint_ids: Vec<ConstraintId>,
    pub enrich: bool,
}

/// Handler for starting analyses.
///
/// Returns as soon as the RUNNING row exists and the job is queued. Pipeline
/// failures never surface here; callers poll the analysis status.
pub struct StartAnalysisHandler {
    analyses: Arc<dyn AnalysisRepository>,
    queue: Arc<dyn AnalysisQueue>,
}

impl StartAnalysisHandler {
    pub fn new(analyses: Arc<dyn AnalysisRepository>, queue: Arc<dyn AnalysisQueue>) -> Self {
        Self { analyses, queue }
    }

    /// # Errors
    ///
    /// - `QueueFull` if the worker queue has no free slot (the analysis is
    ///   recorded as FAILED)
    /// - `Infrastructure` if the analysis row cannot be written
    pub async fn handle(&self, cmd: StartAnalysisCommand) -> Result<AnalysisId, AnalysisError> {
        let analysis = Analysis::start(cmd.document_id, cmd.constraint_ids, cmd.enrich);
        create_and_dispatch(self.analyses.as_ref(), self.queue.as_ref(), analysis).await
    }
}
