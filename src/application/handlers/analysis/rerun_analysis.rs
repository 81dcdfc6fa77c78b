//! RerunAnalysisHandler - repeats a finished analysis as a brand-new one.
//!
//! The previous analysis is never reopened; the new one points back to it
//! through `rerun_of` so every attempt stays in the audit history.

use std::sync::Arc;

use tracing::debug;

use super::dispatch::create_and_dispatch;
use crate::domain::analysis::{Analysis, AnalysisError, RerunConstraintPolicy};
use crate::domain::foundation::{AnalysisId, ConstraintId};
use crate::ports::{AnalysisQueue, AnalysisRepository, ConstraintReader, DocumentRepository};

/// Command to rerun an analysis.
#[derive(Debug, Clone)]
pub struct RerunAnalysisCommand {
    pub analysis_id: AnalysisId,
    /// Overrides the previous run's enrichment flag when set.
    pub enrich: Option<bool>,
}

/// Handler for reruns.
pub struct RerunAnalysisHandler {
    analyses: Arc<dyn AnalysisRepository>,
    documents: Arc<dyn DocumentRepository>,
    constraints: Arc<dyn ConstraintReader>,
    queue: Arc<dyn AnalysisQueue>,
    policy: RerunConstraintPolicy,
}

impl RerunAnalysisHandler {
    pub fn new(
        analyses: Arc<dyn AnalysisRepository>,
        documents: Arc<dyn DocumentRepository>,
        constraints: Arc<dyn ConstraintReader>,
        queue: Arc<dyn AnalysisQueue>,
        policy: RerunConstraintPolicy,
    ) -> Self {
        Self {
            analyses,
            documents,
            constraints,
            queue,
            policy,
        }
    }

    /// # Errors
    ///
    /// - `NotFound` if the previous analysis does not exist
    /// - `InvalidState` if it is still running
    /// - `DocumentNotFound` if re-resolving and the document is gone
    /// - `QueueFull` if the worker queue has no free slot
    pub async fn handle(&self, cmd: RerunAnalysisCommand) -> Result<AnalysisId, AnalysisError> {
        let previous = self
            .analyses
            .find_by_id(&cmd.analysis_id)
            .await?
            .ok_or(AnalysisError::NotFound(cmd.analysis_id))?;

        if !previous.is_finalized() {
            return Err(AnalysisError::invalid_state(format!(
                "analysis {} is still running and cannot be rerun",
                cmd.analysis_id
            )));
        }

        let constraint_ids = self.resolve_constraints(&previous).await?;
        debug!(
            previous_id = %cmd.analysis_id,
            policy = %self.policy,
            constraint_count = constraint_ids.len(),
            "Resolved rerun constraint set"
        );

        let enrich = cmd.enrich.unwrap_or_else(|| previous.enrich_requested());
        let analysis = Analysis::rerun(&previous, constraint_ids, enrich)?;
        create_and_dispatch(self.analyses.as_ref(), self.queue.as_ref(), analysis).await
    }

    async fn resolve_constraints(
        &self,
        previous: &Analysis,
    ) -> Result<Vec<ConstraintId>, AnalysisError> {
        match self.policy {
            RerunConstraintPolicy::Frozen => Ok(previous.constraint_ids().to_vec()),
            RerunConstraintPolicy::Reresolve => {
                let document = self
                    .documents
                    .find_by_id(previous.document_id())
                    .await?
                    .ok_or(AnalysisError::DocumentNotFound(*previous.document_id()))?;
                Ok(self
                    .constraints
                    .active_ids_for_owner(document.owner_id())
                    .await?)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{
        InMemoryAnalysisRepository, InMemoryConstraintStore, InMemoryDocumentRepository,
    };
    use crate::domain::analysis::AnalysisStatus;
    use crate::domain::constraint::{Constraint, Operator, Severity};
    use crate::domain::document::{Document, FileType};
    use crate::domain::foundation::{DocumentId, DomainError, UserId};
    use crate::ports::AnalysisJob;
    use std::sync::Mutex;

    struct RecordingQueue {
        submitted: Mutex<Vec<AnalysisJob>>,
    }

    impl AnalysisQueue for RecordingQueue {
        fn submit(&self, job: AnalysisJob) -> Result<(), DomainError> {
            self.submitted.lock().unwrap().push(job);
            Ok(())
        }

        fn cancel(&self, _analysis_id: &AnalysisId) -> bool {
            false
        }
    }

    struct Fixture {
        analyses: InMemoryAnalysisRepository,
        documents: InMemoryDocumentRepository,
        constraints: InMemoryConstraintStore,
        queue: Arc<RecordingQueue>,
        owner: UserId,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                analyses: InMemoryAnalysisRepository::new(),
                documents: InMemoryDocumentRepository::new(),
                constraints: InMemoryConstraintStore::new(),
                queue: Arc::new(RecordingQueue {
                    submitted: Mutex::new(Vec::new()),
                }),
                owner: UserId::new("owner-7").unwrap(),
            }
        }

        fn handler(&self, policy: RerunConstraintPolicy) -> RerunAnalysisHandler {
            RerunAnalysisHandler::new(
                Arc::new(self.analyses.clone()),
                Arc::new(self.documents.clone()),
                Arc::new(self.constraints.clone()),
                self.queue.clone(),
                policy,
            )
        }

        async fn constraint(&self, metric: &str, active: bool) -> ConstraintId {
            let c = Constraint::new(
                ConstraintId::new(),
                self.owner.clone(),
                metric,
                metric,
                Operator::GreaterThan,
                0.0,
                Severity::Warning,
            )
            .unwrap()
            .with_active(active);
            let id = *c.id();
            self.constraints.upsert(c).await;
            id
        }

        async fn finished_analysis(&self, constraint_ids: Vec<ConstraintId>) -> Analysis {
            let doc = Document::upload(self.owner.clone(), "annual.csv", FileType::Csv).unwrap();
            self.documents.save(&doc).await.unwrap();
            let mut analysis = Analysis::start(*doc.id(), constraint_ids, true);
            self.analyses.create(&analysis).await.unwrap();
            analysis.fail("[NO_METRICS_AVAILABLE] nothing extracted").unwrap();
            self.analyses.finalize(&analysis).await.unwrap();
            analysis
        }
    }

    #[tokio::test]
    async fn frozen_policy_reuses_previous_constraints() {
        let fx = Fixture::new();
        let old = fx.constraint("eps", true).await;
        let previous = fx.finished_analysis(vec![old]).await;
        fx.constraint("roe", true).await;

        let id = fx
            .handler(RerunConstraintPolicy::Frozen)
            .handle(RerunAnalysisCommand {
                analysis_id: *previous.id(),
                enrich: None,
            })
            .await
            .unwrap();

        let rerun = fx.analyses.find_by_id(&id).await.unwrap().unwrap();
        assert_eq!(rerun.status(), AnalysisStatus::Running);
        assert_eq!(rerun.constraint_ids(), &[old]);
        assert_eq!(rerun.rerun_of(), Some(previous.id()));
        assert_eq!(rerun.document_id(), previous.document_id());
        assert!(rerun.enrich_requested());
        assert_eq!(fx.queue.submitted.lock().unwrap().len(), 1);

        let original = fx.analyses.find_by_id(previous.id()).await.unwrap().unwrap();
        assert_eq!(original.status(), AnalysisStatus::Failed);
    }

    #[tokio::test]
    async fn reresolve_policy_picks_up_current_active_constraints() {
        let fx = Fixture::new();
        let old = fx.constraint("eps", true).await;
        let previous = fx.finished_analysis(vec![old]).await;
        fx.constraints.delete(&old).await;
        let added = fx.constraint("roe", true).await;
        fx.constraint("roa", false).await;

        let id = fx
            .handler(RerunConstraintPolicy::Reresolve)
            .handle(RerunAnalysisCommand {
                analysis_id: *previous.id(),
                enrich: Some(false),
            })
            .await
            .unwrap();

        let rerun = fx.analyses.find_by_id(&id).await.unwrap().unwrap();
        assert_eq!(rerun.constraint_ids(), &[added]);
        assert!(!rerun.enrich_requested());
    }

    #[tokio::test]
    async fn running_analysis_cannot_be_rerun() {
        let fx = Fixture::new();
        let running = Analysis::start(DocumentId::new(), vec![], false);
        fx.analyses.create(&running).await.unwrap();

        let err = fx
            .handler(RerunConstraintPolicy::Frozen)
            .handle(RerunAnalysisCommand {
                analysis_id: *running.id(),
                enrich: None,
            })
            .await
            .unwrap_err();

        assert!(matches!(err, AnalysisError::InvalidState(_)));
        assert!(fx.queue.submitted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_analysis_is_not_found() {
        let fx = Fixture::new();
        let id = AnalysisId::new();
        let err = fx
            .handler(RerunConstraintPolicy::Frozen)
            .handle(RerunAnalysisCommand {
                analysis_id: id,
                enrich: None,
            })
            .await
            .unwrap_err();

        assert_eq!(err, AnalysisError::NotFound(id));
    }
}
