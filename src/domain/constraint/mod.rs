//! Constraint module - threshold rules and their evaluation.
//!
//! - `Constraint` - the user-owned rule entity
//! - `Operator` / `Severity` - rule vocabulary
//! - `Violation` - ephemeral evaluation result
//! - `ConstraintEvaluator` - pure evaluation over a metric set

#[allow(clippy::module_inception)]
mod constraint;
mod evaluator;
mod operator;
mod severity;
mod violation;

pub use constraint::Constraint;
pub use evaluator::ConstraintEvaluator;
pub use operator::Operator;
pub use severity::Severity;
pub use violation::Violation;
