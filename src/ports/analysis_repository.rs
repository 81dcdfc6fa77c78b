//! Analysis repository port.
//!
//! # Design
//!
//! - **Create-then-finalize**: rows are inserted as `running` and written
//!   once more when they reach a terminal state
//! - **Write-once terminal status**: `finalize` must refuse to touch a row
//!   that is no longer `running`, even if the caller's copy says otherwise
//! - **Single writer**: only the orchestrator run that owns an analysis id
//!   calls `finalize` for it

use async_trait::async_trait;

use crate::domain::analysis::Analysis;
use crate::domain::foundation::{AnalysisId, DocumentId, DomainError};

/// Repository port for Analysis persistence.
#[async_trait]
pub trait AnalysisRepository: Send + Sync {
    /// Insert a new running analysis.
    ///
    /// # Errors
    ///
    /// - `DatabaseError` on persistence failure
    async fn create(&self, analysis: &Analysis) -> Result<(), DomainError>;

    /// Find an analysis by id.
    async fn find_by_id(&self, id: &AnalysisId) -> Result<Option<Analysis>, DomainError>;

    /// Persist the terminal status, completion time, error message and
    /// enrichment blob of a finalized analysis.
    ///
    /// # Errors
    ///
    /// - `AnalysisNotFound` if no such row exists
    /// - `AnalysisAlreadyFinalized` if the stored row is already terminal
    /// - `InvalidStateTransition` if `analysis` itself is still running
    /// - `DatabaseError` on persistence failure
    async fn finalize(&self, analysis: &Analysis) -> Result<(), DomainError>;

    /// All analyses of a document, newest first.
    async fn list_by_document(&self, document_id: &DocumentId)
        -> Result<Vec<Analysis>, DomainError>;

    /// Analyses still RUNNING, oldest first, at most `limit` of them.
    async fn list_running(&self, limit: u32) -> Result<Vec<Analysis>, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analysis_repository_is_object_safe() {
        fn _accepts_dyn(_repo: &dyn AnalysisRepository) {}
    }
}
