//! In-memory AlertRepository.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::alert::Alert;
use crate::domain::foundation::{AnalysisId, DomainError};
use crate::ports::AlertRepository;

/// Alerts grouped by analysis, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAlertRepository {
    alerts: Arc<RwLock<HashMap<AnalysisId, Vec<Alert>>>>,
}

impl InMemoryAlertRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total alerts across all analyses.
    pub async fn total(&self) -> usize {
        self.alerts.read().await.values().map(Vec::len).sum()
    }
}

#[async_trait]
impl AlertRepository for InMemoryAlertRepository {
    async fn save_alerts(
        &self,
        analysis_id: &AnalysisId,
        alerts: &[Alert],
    ) -> Result<(), DomainError> {
        if alerts.is_empty() {
            return Ok(());
        }
        self.alerts
            .write()
            .await
            .entry(*analysis_id)
            .or_default()
            .extend_from_slice(alerts);
        Ok(())
    }

    async fn find_by_analysis(&self, analysis_id: &AnalysisId) -> Result<Vec<Alert>, DomainError> {
        Ok(self
            .alerts
            .read()
            .await
            .get(analysis_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn count_by_analysis(&self, analysis_id: &AnalysisId) -> Result<u64, DomainError> {
        Ok(self
            .alerts
            .read()
            .await
            .get(analysis_id)
            .map_or(0, |alerts| alerts.len() as u64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::constraint::Severity;
    use crate::domain::foundation::{AlertId, ConstraintId, Timestamp};

    fn alert(analysis_id: AnalysisId) -> Alert {
        Alert {
            id: AlertId::new(),
            analysis_id,
            constraint_id: ConstraintId::new(),
            metric_name: "current_ratio".to_string(),
            severity: Severity::Warning,
            message: "current_ratio must be >= 1".to_string(),
            actual_value: 0.8,
            expected_value: 1.0,
            acknowledged: false,
            created_at: Timestamp::now(),
        }
    }

    #[tokio::test]
    async fn alerts_are_scoped_to_their_analysis() {
        let repo = InMemoryAlertRepository::new();
        let first = AnalysisId::new();
        let second = AnalysisId::new();

        repo.save_alerts(&first, &[alert(first), alert(first)])
            .await
            .unwrap();
        repo.save_alerts(&second, &[alert(second)]).await.unwrap();

        assert_eq!(repo.count_by_analysis(&first).await.unwrap(), 2);
        assert_eq!(repo.find_by_analysis(&second).await.unwrap().len(), 1);
        assert_eq!(repo.total().await, 3);
    }

    #[tokio::test]
    async fn unknown_analysis_has_no_alerts() {
        let repo = InMemoryAlertRepository::new();
        let id = AnalysisId::new();
        assert!(repo.find_by_analysis(&id).await.unwrap().is_empty());
        assert_eq!(repo.count_by_analysis(&id).await.unwrap(), 0);
    }
}
