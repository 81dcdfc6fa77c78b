//! Alert repository port.
//!
//! Saving is not transactional across calls. Alerts written before a
//! failure stay valid and are never deleted by the pipeline.

use async_trait::async_trait;

use crate::domain::alert::Alert;
use crate::domain::foundation::{AnalysisId, DomainError};

/// Repository port for Alert persistence.
#[async_trait]
pub trait AlertRepository: Send + Sync {
    /// Persist the alerts produced by one analysis.
    ///
    /// # Errors
    ///
    /// - `DatabaseError` on persistence failure; some alerts may already be stored
    async fn save_alerts(&self, analysis_id: &AnalysisId, alerts: &[Alert])
        -> Result<(), DomainError>;

    /// All alerts of an analysis, oldest first.
    async fn find_by_analysis(&self, analysis_id: &AnalysisId) -> Result<Vec<Alert>, DomainError>;

    /// Number of alerts stored for an analysis.
    async fn count_by_analysis(&self, analysis_id: &AnalysisId) -> Result<u64, DomainError>;
}
