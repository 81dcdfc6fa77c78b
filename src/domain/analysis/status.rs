//! AnalysisStatus - lifecycle of one pipeline run.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{StateMachine, ValidationError};

/// Lifecycle status of an analysis.
///
/// Valid transitions:
/// - Running -> Completed
/// - Running -> Failed
///
/// Both terminal states are final.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStatus {
    #[default]
    Running,
    Completed,
    Failed,
}

impl AnalysisStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisStatus::Running => "running",
            AnalysisStatus::Completed => "completed",
            AnalysisStatus::Failed => "failed",
        }
    }
}

impl StateMachine for AnalysisStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use AnalysisStatus::*;
        matches!((self, target), (Running, Completed) | (Running, Failed))
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use AnalysisStatus::*;
        match self {
            Running => vec![Completed, Failed],
            Completed | Failed => vec![],
        }
    }
}

impl fmt::Display for AnalysisStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnalysisStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "running" => Ok(AnalysisStatus::Running),
            "completed" => Ok(AnalysisStatus::Completed),
            "failed" => Ok(AnalysisStatus::Failed),
            other => Err(ValidationError::invalid_format(
                "analysis.status",
                format!("unknown status '{}'", other),
            )),
        }
    }
}
