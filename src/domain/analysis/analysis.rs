//! Analysis aggregate - one execution of the pipeline for a document.
//!
//! An analysis is created in `Running` and moves to `Completed` or `Failed`
//! exactly once. A rerun never reopens an analysis; it creates a new one
//! pointing back through `rerun_of`.

use serde::{Deserialize, Serialize};

use super::AnalysisStatus;
use crate::domain::foundation::{
    AnalysisId, ConstraintId, DocumentId, DomainError, ErrorCode, StateMachine, Timestamp,
};

/// Analysis aggregate.
///
/// # Invariants
///
/// - `completed_at` is set iff status is terminal
/// - `error_message` is set iff status is `Failed`, and is never empty
/// - once terminal, no method changes status again
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    id: AnalysisId,
    document_id: DocumentId,
    constraint_ids: Vec<ConstraintId>,
    enrich_requested: bool,
    status: AnalysisStatus,
    started_at: Timestamp,
    completed_at: Option<Timestamp>,
    error_message: Option<String>,
    enrichment: Option<serde_json::Value>,
    rerun_of: Option<AnalysisId>,
}

impl Analysis {
    /// Start a new running analysis.
    ///
    /// Duplicate constraint ids are dropped, first occurrence wins.
    pub fn start(
        document_id: DocumentId,
        constraint_ids: Vec<ConstraintId>,
        enrich_requested: bool,
    ) -> Self {
        Self {
            id: AnalysisId::new(),
            document_id,
            constraint_ids: dedup_preserving_order(constraint_ids),
            enrich_requested,
            status: AnalysisStatus::Running,
            started_at: Timestamp::now(),
            completed_at: None,
            error_message: None,
            enrichment: None,
            rerun_of: None,
        }
    }

    /// Start a new running analysis that repeats a finished one.
    ///
    /// # Errors
    ///
    /// - `InvalidStateTransition` if `previous` is still running
    pub fn rerun(
        previous: &Analysis,
        constraint_ids: Vec<ConstraintId>,
        enrich_requested: bool,
    ) -> Result<Self, DomainError> {
        if !previous.is_finalized() {
            return Err(DomainError::new(
                ErrorCode::InvalidStateTransition,
                format!("Analysis {} is still running and cannot be rerun", previous.id),
            ));
        }

        let mut analysis = Self::start(previous.document_id, constraint_ids, enrich_requested);
        analysis.rerun_of = Some(previous.id);
        Ok(analysis)
    }

    /// Reconstitute an analysis from persistence (no validation).
    #[allow(clippy::too_many_arguments)]
    pub fn reconstitute(
        id: AnalysisId,
        document_id: DocumentId,
        constraint_ids: Vec<ConstraintId>,
        enrich_requested: bool,
        status: AnalysisStatus,
        started_at: Timestamp,
        completed_at: Option<Timestamp>,
        error_message: Option<String>,
        enrichment: Option<serde_json::Value>,
        rerun_of: Option<AnalysisId>,
    ) -> Self {
        Self {
            id,
            document_id,
            constraint_ids,
            enrich_requested,
            status,
            started_at,
            completed_at,
            error_message,
            enrichment,
            rerun_of,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    pub fn id(&self) -> &AnalysisId {
        &self.id
    }

    pub fn document_id(&self) -> &DocumentId {
        &self.document_id
    }

    /// Constraint set bound to this run.
    pub fn constraint_ids(&self) -> &[ConstraintId] {
        &self.constraint_ids
    }

    pub fn enrich_requested(&self) -> bool {
        self.enrich_requested
    }

    pub fn status(&self) -> AnalysisStatus {
        self.status
    }

    pub fn started_at(&self) -> &Timestamp {
        &self.started_at
    }

    pub fn completed_at(&self) -> Option<&Timestamp> {
        self.completed_at.as_ref()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// Opaque enrichment output, if enrichment succeeded.
    pub fn enrichment(&self) -> Option<&serde_json::Value> {
        self.enrichment.as_ref()
    }

    pub fn rerun_of(&self) -> Option<&AnalysisId> {
        self.rerun_of.as_ref()
    }

    pub fn is_finalized(&self) -> bool {
        self.status.is_terminal()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Mutations
    // ─────────────────────────────────────────────────────────────────────────

    /// Attach the enrichment blob while the run is in flight.
    ///
    /// # Errors
    ///
    /// - `AnalysisAlreadyFinalized` if the analysis is terminal
    pub fn record_enrichment(&mut self, enrichment: serde_json::Value) -> Result<(), DomainError> {
        self.ensure_running()?;
        self.enrichment = Some(enrichment);
        Ok(())
    }

    /// Finalize as completed.
    ///
    /// # Errors
    ///
    /// - `AnalysisAlreadyFinalized` if the analysis is terminal
    pub fn complete(&mut self) -> Result<(), DomainError> {
        self.finalize(AnalysisStatus::Completed, None)
    }

    /// Finalize as failed with a captured error message.
    ///
    /// An empty message is replaced so failed analyses always explain themselves.
    ///
    /// # Errors
    ///
    /// - `AnalysisAlreadyFinalized` if the analysis is terminal
    pub fn fail(&mut self, error_message: impl Into<String>) -> Result<(), DomainError> {
        let mut message = error_message.into();
        if message.trim().is_empty() {
            message = "analysis failed without an error message".to_string();
        }
        self.finalize(AnalysisStatus::Failed, Some(message))
    }

    fn finalize(
        &mut self,
        target: AnalysisStatus,
        error_message: Option<String>,
    ) -> Result<(), DomainError> {
        self.ensure_running()?;
        self.status = self.status.transition_to(target).map_err(|e| {
            DomainError::new(ErrorCode::InvalidStateTransition, e.to_string())
        })?;
        self.completed_at = Some(Timestamp::now());
        self.error_message = error_message;
        Ok(())
    }

    fn ensure_running(&self) -> Result<(), DomainError> {
        if self.is_finalized() {
            return Err(DomainError::new(
                ErrorCode::AnalysisAlreadyFinalized,
                format!("Analysis {} is already {}", self.id, self.status),
            ));
        }
        Ok(())
    }
}

fn dedup_preserving_order(ids: Vec<ConstraintId>) -> Vec<ConstraintId> {
    let mut seen = std::collections::HashSet::with_capacity(ids.len());
    ids.into_iter().filter(|id| seen.insert(*id)).collect()
}
