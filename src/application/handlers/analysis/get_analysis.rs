//! GetAnalysisHandler - status polling for one analysis.

use serde::Serialize;
use std::sync::Arc;

use crate::domain::analysis::{Analysis, AnalysisError, AnalysisStatus};
use crate::domain::foundation::{AnalysisId, DocumentId, Timestamp};
use crate::ports::{AlertRepository, AnalysisRepository};

/// Read model returned to pollers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisView {
    pub id: AnalysisId,
    pub document_id: DocumentId,
    pub status: AnalysisStatus,
    pub started_at: Timestamp,
    pub completed_at: Option<Timestamp>,
    pub error_message: Option<String>,
    pub alert_count: u64,
    pub rerun_of: Option<AnalysisId>,
}

impl AnalysisView {
    pub(super) fn from_analysis(analysis: &Analysis, alert_count: u64) -> Self {
        Self {
            id: *analysis.id(),
            document_id: *analysis.document_id(),
            status: analysis.status(),
            started_at: *analysis.started_at(),
            completed_at: analysis.completed_at().copied(),
            error_message: analysis.error_message().map(str::to_string),
            alert_count,
            rerun_of: analysis.rerun_of().copied(),
        }
    }
}

/// Query handler for a single analysis.
pub struct GetAnalysisHandler {
    analyses: Arc<dyn AnalysisRepository>,
    alerts: Arc<dyn AlertRepository>,
}

impl GetAnalysisHandler {
    pub fn new(analyses: Arc<dyn AnalysisRepository>, alerts: Arc<dyn AlertRepository>) -> Self {
        Self { analyses, alerts }
    }

    /// # Errors
    ///
    /// - `NotFound` if no analysis has this id
    pub async fn handle(&self, analysis_id: AnalysisId) -> Result<AnalysisView, AnalysisError> {
        let analysis = self
            .analyses
            .find_by_id(&analysis_id)
            .await?
            .ok_or(AnalysisError::NotFound(analysis_id))?;

        let alert_count = self.alerts.count_by_analysis(&analysis_id).await?;
        Ok(AnalysisView::from_analysis(&analysis, alert_count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{InMemoryAlertRepository, InMemoryAnalysisRepository};
    use crate::domain::alert::Alert;
    use crate::domain::constraint::Severity;
    use crate::domain::foundation::{AlertId, ConstraintId};

    fn alert(analysis_id: AnalysisId) -> Alert {
        Alert {
            id: AlertId::new(),
            analysis_id,
            constraint_id: ConstraintId::new(),
            metric_name: "net_margin".to_string(),
            severity: Severity::Info,
            message: "net_margin must be >= 5".to_string(),
            actual_value: 3.0,
            expected_value: 5.0,
            acknowledged: false,
            created_at: Timestamp::now(),
        }
    }

    #[tokio::test]
    async fn returns_running_view_without_completion() {
        let analyses = InMemoryAnalysisRepository::new();
        let analysis = Analysis::start(DocumentId::new(), vec![], false);
        analyses.create(&analysis).await.unwrap();

        let handler = GetAnalysisHandler::new(
            Arc::new(analyses),
            Arc::new(InMemoryAlertRepository::new()),
        );
        let view = handler.handle(*analysis.id()).await.unwrap();

        assert_eq!(view.status, AnalysisStatus::Running);
        assert!(view.completed_at.is_none());
        assert!(view.error_message.is_none());
        assert_eq!(view.alert_count, 0);
    }

    #[tokio::test]
    async fn reports_terminal_state_and_alert_count() {
        let analyses = InMemoryAnalysisRepository::new();
        let alerts = InMemoryAlertRepository::new();
        let mut analysis = Analysis::start(DocumentId::new(), vec![], false);
        analyses.create(&analysis).await.unwrap();
        alerts
            .save_alerts(analysis.id(), &[alert(*analysis.id()), alert(*analysis.id())])
            .await
            .unwrap();
        analysis.complete().unwrap();
        analyses.finalize(&analysis).await.unwrap();

        let handler = GetAnalysisHandler::new(Arc::new(analyses), Arc::new(alerts));
        let view = handler.handle(*analysis.id()).await.unwrap();

        assert_eq!(view.status, AnalysisStatus::Completed);
        assert!(view.completed_at.is_some());
        assert_eq!(view.alert_count, 2);
    }

    #[tokio::test]
    async fn unknown_id_is_not_found() {
        let handler = GetAnalysisHandler::new(
            Arc::new(InMemoryAnalysisRepository::new()),
            Arc::new(InMemoryAlertRepository::new()),
        );
        let id = AnalysisId::new();

        let err = handler.handle(id).await.unwrap_err();
        assert_eq!(err, AnalysisError::NotFound(id));
    }
}
