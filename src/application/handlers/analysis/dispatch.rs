//! Create-then-dispatch, shared by the start and rerun handlers.

use tracing::{error, info};

use crate::domain::analysis::{Analysis, AnalysisError};
use crate::domain::foundation::{AnalysisId, ErrorCode};
use crate::ports::{AnalysisJob, AnalysisQueue, AnalysisRepository};

/// Persists a fresh RUNNING analysis and hands it to the queue.
///
/// If the queue refuses the job the analysis is finalized FAILED right away
/// so no row is left RUNNING without a worker.
pub(super) async fn create_and_dispatch(
    analyses: &dyn AnalysisRepository,
    queue: &dyn AnalysisQueue,
    mut analysis: Analysis,
) -> Result<AnalysisId, AnalysisError> {
    let analysis_id = *analysis.id();
    analyses.create(&analysis).await?;

    if let Err(err) = queue.submit(AnalysisJob::new(analysis_id)) {
        error!(
            analysis_id = %analysis_id,
            error = %err,
            "Analysis could not be queued"
        );
        analysis.fail(err.message.clone())?;
        analyses.finalize(&analysis).await?;

        return Err(match err.code {
            ErrorCode::QueueFull => AnalysisError::QueueFull,
            _ => AnalysisError::from(err),
        });
    }

    info!(
        analysis_id = %analysis_id,
        document_id = %analysis.document_id(),
        constraint_count = analysis.constraint_ids().len(),
        enrich = analysis.enrich_requested(),
        "Analysis started"
    );
    Ok(analysis_id)
}
