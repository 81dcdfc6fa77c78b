//! ListAnalysesHandler - every analysis of a document, newest first.

use std::sync::Arc;

use super::AnalysisView;
use crate::domain::analysis::AnalysisError;
use crate::domain::foundation::DocumentId;
use crate::ports::{AlertRepository, AnalysisRepository};

/// Query handler listing a document's analyses.
pub struct ListAnalysesHandler {
    analyses: Arc<dyn AnalysisRepository>,
    alerts: Arc<dyn AlertRepository>,
}

impl ListAnalysesHandler {
    pub fn new(analyses: Arc<dyn AnalysisRepository>, alerts: Arc<dyn AlertRepository>) -> Self {
        Self { analyses, alerts }
    }

    pub async fn handle(&self, document_id: DocumentId) -> Result<Vec<AnalysisView>, AnalysisError> {
        let analyses = self.analyses.list_by_document(&document_id).await?;

        let mut views = Vec::with_capacity(analyses.len());
        for analysis in &analyses {
            let alert_count = self.alerts.count_by_analysis(analysis.id()).await?;
            views.push(AnalysisView::from_analysis(analysis, alert_count));
        }
        Ok(views)
    }
}
