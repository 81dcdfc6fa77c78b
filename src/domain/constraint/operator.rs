//! Comparison operators for threshold rules.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::ValidationError;

/// Comparison between a metric value and a rule threshold.
///
/// Each operator reads as "metric must be <op> threshold". Comparison is
/// plain IEEE-754 with no tolerance, so `Eq`/`Ne` are exact equality checks
/// on doubles.
///
/// A rule is violated exactly when it does not hold. At the threshold itself
/// this treats both directions alike: strict operators (`<`, `>`) are
/// violated and inclusive ones (`<=`, `>=`) are not. With threshold 10 and
/// value 10, `>` is violated and `>=` holds, mirroring `<` and `<=`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = "<")]
    LessThan,
    #[serde(rename = ">")]
    GreaterThan,
    #[serde(rename = "=")]
    Equal,
    #[serde(rename = "<=")]
    LessOrEqual,
    #[serde(rename = ">=")]
    GreaterOrEqual,
    #[serde(rename = "!=")]
    NotEqual,
}

impl Operator {
    /// All operators, in declaration order.
    pub const ALL: [Operator; 6] = [
        Operator::LessThan,
        Operator::GreaterThan,
        Operator::Equal,
        Operator::LessOrEqual,
        Operator::GreaterOrEqual,
        Operator::NotEqual,
    ];

    /// Returns true if `actual <op> threshold` holds.
    #[allow(clippy::float_cmp)]
    pub fn holds(&self, actual: f64, threshold: f64) -> bool {
        match self {
            Operator::LessThan => actual < threshold,
            Operator::GreaterThan => actual > threshold,
            Operator::Equal => actual == threshold,
            Operator::LessOrEqual => actual <= threshold,
            Operator::GreaterOrEqual => actual >= threshold,
            Operator::NotEqual => actual != threshold,
        }
    }

    /// Returns true if the rule is broken by `actual`.
    pub fn is_violated_by(&self, actual: f64, threshold: f64) -> bool {
        !self.holds(actual, threshold)
    }

    /// Canonical symbol for the operator.
    pub fn symbol(&self) -> &'static str {
        match self {
            Operator::LessThan => "<",
            Operator::GreaterThan => ">",
            Operator::Equal => "=",
            Operator::LessOrEqual => "<=",
            Operator::GreaterOrEqual => ">=",
            Operator::NotEqual => "!=",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Operator {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "<" | "lt" => Ok(Operator::LessThan),
            ">" | "gt" => Ok(Operator::GreaterThan),
            "=" | "==" | "eq" => Ok(Operator::Equal),
            "<=" | "lte" => Ok(Operator::LessOrEqual),
            ">=" | "gte" => Ok(Operator::GreaterOrEqual),
            "!=" | "<>" | "ne" => Ok(Operator::NotEqual),
            other => Err(ValidationError::invalid_format(
                "operator",
                format!("unknown operator '{}'", other),
            )),
        }
    }
}
