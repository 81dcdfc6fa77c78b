//! Constraint Evaluator - pure rule evaluation over a metric set.

use std::cmp::Ordering;
use std::collections::HashMap;

use super::{Constraint, Violation};
use crate::domain::metric::Metric;

/// Rule evaluation functions.
pub struct ConstraintEvaluator;

impl ConstraintEvaluator {
    /// Evaluates every active constraint against the metrics it targets.
    ///
    /// # Algorithm
    /// For each active constraint, every metric whose name equals
    /// `constraint.metric` is compared independently; a violation is produced
    /// when `value <op> threshold` does not hold.
    ///
    /// # Edge Cases
    /// - Inactive constraint: skipped
    /// - No metric with the target name: skipped, absence is not a violation
    /// - Several metrics with the target name (periods, sources): each checked
    /// - Nothing violated: empty Vec
    ///
    /// Output is sorted by constraint id, then metric name, period, source
    /// and value, so identical inputs always yield identical output.
    pub fn evaluate(constraints: &[Constraint], metrics: &[Metric]) -> Vec<Violation> {
        let mut by_name: HashMap<&str, Vec<&Metric>> = HashMap::new();
        for metric in metrics {
            by_name.entry(metric.name()).or_default().push(metric);
        }

        let mut violations = Vec::new();

        for constraint in constraints.iter().filter(|c| c.is_active()) {
            let Some(targets) = by_name.get(constraint.metric()) else {
                continue;
            };

            for metric in targets {
                if constraint
                    .operator()
                    .is_violated_by(metric.value(), constraint.threshold())
                {
                    violations.push(Self::violation(constraint, metric));
                }
            }
        }

        violations.sort_by(Self::canonical_order);
        violations
    }

    fn violation(constraint: &Constraint, metric: &Metric) -> Violation {
        Violation {
            constraint_id: *constraint.id(),
            metric_name: metric.name().to_string(),
            period: metric.period().to_string(),
            source: metric.source().to_string(),
            actual_value: metric.value(),
            expected_value: constraint.threshold(),
            operator: constraint.operator(),
            severity: constraint.severity(),
            message: constraint.message().to_string(),
        }
    }

    fn canonical_order(a: &Violation, b: &Violation) -> Ordering {
        a.constraint_id
            .cmp(&b.constraint_id)
            .then_with(|| a.metric_name.cmp(&b.metric_name))
            .then_with(|| a.period.cmp(&b.period))
            .then_with(|| a.source.cmp(&b.source))
            .then_with(|| a.actual_value.total_cmp(&b.actual_value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::constraint::{Operator, Severity};
    use crate::domain::foundation::{ConstraintId, UserId};
    use proptest::prelude::*;

    fn rule(metric: &str, operator: Operator, threshold: f64, severity: Severity) -> Constraint {
        Constraint::new(
            ConstraintId::new(),
            UserId::new("analyst").unwrap(),
            format!("{} rule", metric),
            metric,
            operator,
            threshold,
            severity,
        )
        .unwrap()
    }

    fn metric(name: &str, value: f64) -> Metric {
        Metric::new(name, value).unwrap()
    }

    #[test]
    fn produces_violation_when_rule_is_broken() {
        let constraints = vec![rule("debt_to_equity", Operator::LessOrEqual, 2.0, Severity::Critical)];
        let metrics = vec![metric("debt_to_equity", 2.5)];

        let violations = ConstraintEvaluator::evaluate(&constraints, &metrics);

        assert_eq!(violations.len(), 1);
        let v = &violations[0];
        assert_eq!(v.constraint_id, *constraints[0].id());
        assert_eq!(v.metric_name, "debt_to_equity");
        assert_eq!(v.actual_value, 2.5);
        assert_eq!(v.expected_value, 2.0);
        assert_eq!(v.severity, Severity::Critical);
    }

    #[test]
    fn no_violation_when_rule_holds() {
        let constraints = vec![rule("current_ratio", Operator::GreaterOrEqual, 1.0, Severity::Warning)];
        let metrics = vec![metric("current_ratio", 1.4)];

        assert!(ConstraintEvaluator::evaluate(&constraints, &metrics).is_empty());
    }

    #[test]
    fn inactive_constraint_is_skipped() {
        let constraints =
            vec![rule("pe_ratio", Operator::LessThan, 5.0, Severity::Critical).with_active(false)];
        let metrics = vec![metric("pe_ratio", 500.0)];

        assert!(ConstraintEvaluator::evaluate(&constraints, &metrics).is_empty());
    }

    #[test]
    fn absent_metric_is_skipped() {
        let constraints = vec![rule("roe", Operator::GreaterThan, 10.0, Severity::Info)];
        let metrics = vec![metric("roa", 1.0)];

        assert!(ConstraintEvaluator::evaluate(&constraints, &metrics).is_empty());
    }

    #[test]
    fn every_period_is_checked_independently() {
        let constraints = vec![rule("net_margin", Operator::GreaterThan, 5.0, Severity::Warning)];
        let metrics = vec![
            metric("net_margin", 8.0).with_period("Q1"),
            metric("net_margin", 3.0).with_period("Q2"),
            metric("net_margin", 1.0).with_period("Q3"),
        ];

        let violations = ConstraintEvaluator::evaluate(&constraints, &metrics);

        let periods: Vec<&str> = violations.iter().map(|v| v.period.as_str()).collect();
        assert_eq!(periods, vec!["Q2", "Q3"]);
    }

    #[test]
    fn operator_table_at_threshold_ten() {
        let expectations = [
            (Operator::LessThan, true),
            (Operator::LessOrEqual, false),
            (Operator::GreaterThan, true),
            (Operator::GreaterOrEqual, false),
            (Operator::Equal, false),
            (Operator::NotEqual, true),
        ];

        for (op, violates) in expectations {
            let constraints = vec![rule("eps", op, 10.0, Severity::Info)];
            let metrics = vec![metric("eps", 10.0)];
            let fired = !ConstraintEvaluator::evaluate(&constraints, &metrics).is_empty();
            assert_eq!(fired, violates, "operator {}", op);
        }
    }

    #[test]
    fn output_is_sorted_by_constraint_then_metric_identity() {
        let a = rule("roe", Operator::GreaterThan, 100.0, Severity::Info);
        let b = rule("roe", Operator::LessThan, -100.0, Severity::Warning);
        let metrics = vec![
            metric("roe", 2.0).with_period("2023"),
            metric("roe", 1.0).with_period("2022"),
        ];

        let forward = ConstraintEvaluator::evaluate(&[a.clone(), b.clone()], &metrics);
        let reversed = ConstraintEvaluator::evaluate(&[b, a], &metrics);

        assert_eq!(forward.len(), 4);
        assert_eq!(forward, reversed);
        assert!(forward.windows(2).all(|w| w[0].constraint_id <= w[1].constraint_id));
        assert_eq!(forward[0].period, "2022");
    }

    fn arb_operator() -> impl Strategy<Value = Operator> {
        prop::sample::select(Operator::ALL.to_vec())
    }

    fn arb_metrics() -> impl Strategy<Value = Vec<Metric>> {
        prop::collection::vec(
            (
                prop::sample::select(vec!["roe", "roa", "eps", "pe_ratio"]),
                -50.0f64..50.0,
                prop::sample::select(vec!["Q1", "Q2", "FY"]),
            ),
            0..12,
        )
        .prop_map(|items| {
            items
                .into_iter()
                .map(|(name, value, period)| metric(name, value).with_period(period))
                .collect()
        })
    }

    fn arb_constraints() -> impl Strategy<Value = Vec<Constraint>> {
        prop::collection::vec(
            (
                prop::sample::select(vec!["roe", "roa", "eps", "missing"]),
                arb_operator(),
                -50.0f64..50.0,
                any::<bool>(),
            ),
            0..8,
        )
        .prop_map(|items| {
            items
                .into_iter()
                .map(|(name, op, threshold, active)| {
                    rule(name, op, threshold, Severity::Warning).with_active(active)
                })
                .collect()
        })
    }

    proptest! {
        #[test]
        fn evaluation_is_deterministic_and_order_independent(
            constraints in arb_constraints(),
            metrics in arb_metrics(),
        ) {
            let first = ConstraintEvaluator::evaluate(&constraints, &metrics);
            let second = ConstraintEvaluator::evaluate(&constraints, &metrics);
            prop_assert_eq!(&first, &second);

            let mut reversed_metrics = metrics.clone();
            reversed_metrics.reverse();
            let mut reversed_constraints = constraints.clone();
            reversed_constraints.reverse();
            let shuffled = ConstraintEvaluator::evaluate(&reversed_constraints, &reversed_metrics);
            prop_assert_eq!(first, shuffled);
        }

        #[test]
        fn inactive_constraints_never_fire(
            constraints in arb_constraints(),
            metrics in arb_metrics(),
        ) {
            let inactive: Vec<Constraint> =
                constraints.into_iter().map(|c| c.with_active(false)).collect();
            prop_assert!(ConstraintEvaluator::evaluate(&inactive, &metrics).is_empty());
        }

        #[test]
        fn every_violation_breaks_its_rule(
            constraints in arb_constraints(),
            metrics in arb_metrics(),
        ) {
            for v in ConstraintEvaluator::evaluate(&constraints, &metrics) {
                prop_assert!(!v.operator.holds(v.actual_value, v.expected_value));
                prop_assert!(constraints.iter().any(|c| c.id() == &v.constraint_id && c.is_active()));
            }
        }
    }
}
