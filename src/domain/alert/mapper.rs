//! Alert Mapper - converts violations into alert records.

use std::collections::HashMap;

use super::Alert;
use crate::domain::constraint::Violation;
use crate::domain::foundation::{AlertId, AnalysisId, ConstraintId, Timestamp};

/// Violation-to-alert conversion functions.
pub struct AlertMapper;

impl AlertMapper {
    /// Builds one alert per distinct `(constraint_id, metric_name)`.
    ///
    /// # Algorithm
    /// Violations are walked in input order. The first violation for a key
    /// claims its output slot; a later violation for the same key replaces it
    /// only when strictly more severe. Severity, message, actual and expected
    /// values are copied verbatim.
    ///
    /// # Edge Cases
    /// - Empty input: Returns empty Vec
    /// - Equal severities: the first encountered wins
    pub fn materialize(violations: &[Violation], analysis_id: AnalysisId) -> Vec<Alert> {
        let mut slots: Vec<&Violation> = Vec::with_capacity(violations.len());
        let mut index: HashMap<(ConstraintId, &str), usize> = HashMap::new();

        for violation in violations {
            let key = (violation.constraint_id, violation.metric_name.as_str());
            match index.get(&key) {
                Some(&slot) => {
                    if violation.severity > slots[slot].severity {
                        slots[slot] = violation;
                    }
                }
                None => {
                    index.insert(key, slots.len());
                    slots.push(violation);
                }
            }
        }

        let created_at = Timestamp::now();
        slots
            .into_iter()
            .map(|v| Alert {
                id: AlertId::new(),
                analysis_id,
                constraint_id: v.constraint_id,
                metric_name: v.metric_name.clone(),
                severity: v.severity,
                message: v.message.clone(),
                actual_value: v.actual_value,
                expected_value: v.expected_value,
                acknowledged: false,
                created_at,
            })
            .collect()
    }
}
