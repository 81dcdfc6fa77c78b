//! Alert entity - the persisted record of a violation within one analysis.

use serde::{Deserialize, Serialize};

use crate::domain::constraint::Severity;
use crate::domain::foundation::{AlertId, AnalysisId, ConstraintId, Timestamp};

/// A user-facing record of a broken rule, tied to one analysis run.
///
/// Alerts are created once and never mutated by the pipeline. The
/// `acknowledged` flag belongs to a separate workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: AlertId,
    pub analysis_id: AnalysisId,
    pub constraint_id: ConstraintId,
    pub metric_name: String,
    pub severity: Severity,
    /// The constraint's message template, unsubstituted.
    pub message: String,
    pub actual_value: f64,
    pub expected_value: f64,
    pub acknowledged: bool,
    pub created_at: Timestamp,
}
