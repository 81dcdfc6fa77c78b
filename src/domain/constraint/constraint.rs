//! Constraint entity - a user-defined threshold rule over one metric.

use serde::{Deserialize, Serialize};

use super::{Operator, Severity};
use crate::domain::foundation::{ConstraintId, UserId, ValidationError};

/// A rule comparing a named metric to a threshold.
///
/// Constraints are edited through a separate CRUD path; the pipeline only
/// reads them and treats them as immutable for the length of a run.
///
/// # Invariants
///
/// - `name` and `metric` are non-empty
/// - `threshold` is finite
/// - `operator` is one of the six supported comparisons (enforced at parse time)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constraint {
    id: ConstraintId,
    owner_id: UserId,
    name: String,
    metric: String,
    operator: Operator,
    threshold: f64,
    severity: Severity,
    message: String,
    active: bool,
}

impl Constraint {
    /// Creates an active constraint with a generated message.
    ///
    /// # Errors
    ///
    /// - `EmptyField` if name or metric is blank
    /// - `InvalidFormat` if threshold is not finite
    pub fn new(
        id: ConstraintId,
        owner_id: UserId,
        name: impl Into<String>,
        metric: impl Into<String>,
        operator: Operator,
        threshold: f64,
        severity: Severity,
    ) -> Result<Self, ValidationError> {
        let name = name.into();
        let metric = metric.into();

        if name.trim().is_empty() {
            return Err(ValidationError::empty_field("constraint.name"));
        }
        if metric.trim().is_empty() {
            return Err(ValidationError::empty_field("constraint.metric"));
        }
        if !threshold.is_finite() {
            return Err(ValidationError::invalid_format(
                "constraint.threshold",
                format!("threshold must be finite, got {}", threshold),
            ));
        }

        let message = format!("{} must be {} {}", metric, operator, threshold);
        Ok(Self {
            id,
            owner_id,
            name,
            metric,
            operator,
            threshold,
            severity,
            message,
            active: true,
        })
    }

    /// Reconstitute a constraint from persistence (no validation).
    #[allow(clippy::too_many_arguments)]
    pub fn reconstitute(
        id: ConstraintId,
        owner_id: UserId,
        name: String,
        metric: String,
        operator: Operator,
        threshold: f64,
        severity: Severity,
        message: String,
        active: bool,
    ) -> Self {
        Self {
            id,
            owner_id,
            name,
            metric,
            operator,
            threshold,
            severity,
            message,
            active,
        }
    }

    /// Replaces the alert message template.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Marks the constraint active or inactive.
    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    pub fn id(&self) -> &ConstraintId {
        &self.id
    }

    pub fn owner_id(&self) -> &UserId {
        &self.owner_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the metric this rule targets.
    pub fn metric(&self) -> &str {
        &self.metric
    }

    pub fn operator(&self) -> Operator {
        self.operator
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// Message template carried onto alerts verbatim.
    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_active(&self) -> bool {
        self.active
    }
}
