//! Violation - the ephemeral result of a rule failing against one metric.

use serde::{Deserialize, Serialize};

use super::{Operator, Severity};
use crate::domain::foundation::ConstraintId;

/// A broken rule for one metric observation.
///
/// Produced and consumed inside a single evaluation; never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    pub constraint_id: ConstraintId,
    pub metric_name: String,
    pub period: String,
    pub source: String,
    pub actual_value: f64,
    /// The rule's threshold.
    pub expected_value: f64,
    pub operator: Operator,
    pub severity: Severity,
    /// The rule's message template.
    pub message: String,
}
