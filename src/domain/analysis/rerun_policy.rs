//! Constraint resolution policy for reruns.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::ValidationError;

/// Which constraint set a rerun evaluates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RerunConstraintPolicy {
    /// Reuse the previous analysis's constraint ids verbatim.
    #[default]
    Frozen,
    /// Resolve the document owner's currently active constraints.
    Reresolve,
}

impl RerunConstraintPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            RerunConstraintPolicy::Frozen => "frozen",
            RerunConstraintPolicy::Reresolve => "reresolve",
        }
    }
}

impl fmt::Display for RerunConstraintPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RerunConstraintPolicy {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "frozen" => Ok(RerunConstraintPolicy::Frozen),
            "reresolve" => Ok(RerunConstraintPolicy::Reresolve),
            other => Err(ValidationError::invalid_format(
                "rerun_constraint_policy",
                format!("unknown policy '{}'", other),
            )),
        }
    }
}
