//! In-memory AnalysisRepository with write-once finalization.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::analysis::Analysis;
use crate::domain::foundation::{AnalysisId, DocumentId, DomainError, ErrorCode};
use crate::ports::AnalysisRepository;

/// In-memory storage for analyses.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAnalysisRepository {
    analyses: Arc<RwLock<HashMap<AnalysisId, Analysis>>>,
}

impl InMemoryAnalysisRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored analyses.
    pub async fn len(&self) -> usize {
        self.analyses.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.analyses.read().await.is_empty()
    }
}

#[async_trait]
impl AnalysisRepository for InMemoryAnalysisRepository {
    async fn create(&self, analysis: &Analysis) -> Result<(), DomainError> {
        let mut analyses = self.analyses.write().await;
        if analyses.contains_key(analysis.id()) {
            return Err(DomainError::new(
                ErrorCode::DatabaseError,
                format!("Analysis already exists: {}", analysis.id()),
            ));
        }
        analyses.insert(*analysis.id(), analysis.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &AnalysisId) -> Result<Option<Analysis>, DomainError> {
        Ok(self.analyses.read().await.get(id).cloned())
    }

    async fn finalize(&self, analysis: &Analysis) -> Result<(), DomainError> {
        if !analysis.is_finalized() {
            return Err(DomainError::new(
                ErrorCode::InvalidStateTransition,
                format!("Analysis {} is still running", analysis.id()),
            ));
        }

        let mut analyses = self.analyses.write().await;
        let stored = analyses.get_mut(analysis.id()).ok_or_else(|| {
            DomainError::new(
                ErrorCode::AnalysisNotFound,
                format!("Analysis not found: {}", analysis.id()),
            )
        })?;

        if stored.is_finalized() {
            return Err(DomainError::new(
                ErrorCode::AnalysisAlreadyFinalized,
                format!("Analysis {} is already {}", stored.id(), stored.status()),
            ));
        }

        *stored = analysis.clone();
        Ok(())
    }

    async fn list_by_document(
        &self,
        document_id: &DocumentId,
    ) -> Result<Vec<Analysis>, DomainError> {
        let analyses = self.analyses.read().await;
        let mut found: Vec<Analysis> = analyses
            .values()
            .filter(|a| a.document_id() == document_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| {
            b.started_at()
                .cmp(a.started_at())
                .then_with(|| b.id().cmp(a.id()))
        });
        Ok(found)
    }

    async fn list_running(&self, limit: u32) -> Result<Vec<Analysis>, DomainError> {
        let analyses = self.analyses.read().await;
        let mut running: Vec<Analysis> = analyses
            .values()
            .filter(|a| !a.is_finalized())
            .cloned()
            .collect();
        running.sort_by(|a, b| {
            a.started_at()
                .cmp(b.started_at())
                .then_with(|| a.id().cmp(b.id()))
        });
        running.truncate(limit as usize);
        Ok(running)
    }
}
