//! Foundation module - Shared domain primitives.
//!
//! Contains identifiers, timestamps, the state machine trait and error
//! types that form the vocabulary of the analysis pipeline.

mod errors;
mod ids;
mod state_machine;
mod timestamp;

pub use errors::{DomainError, ErrorCode, ValidationError};
pub use ids::{AlertId, AnalysisId, ConstraintId, DocumentId, SnapshotId, UserId};
pub use state_machine::StateMachine;
pub use timestamp::Timestamp;
