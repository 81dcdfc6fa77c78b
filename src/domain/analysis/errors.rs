//! Analysis-specific error types.

use crate::domain::foundation::{AnalysisId, DocumentId, DomainError, ErrorCode};

/// Errors surfaced by the analysis trigger and query handlers.
///
/// Pipeline failures never appear here; they are recorded on the analysis
/// itself and observed by polling its status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    /// Analysis was not found.
    NotFound(AnalysisId),
    /// Referenced document was not found.
    DocumentNotFound(DocumentId),
    /// Invalid state for operation.
    InvalidState(String),
    /// Worker queue rejected the run.
    QueueFull,
    /// Validation failed.
    ValidationFailed { field: String, message: String },
    /// Infrastructure error.
    Infrastructure(String),
}

impl AnalysisError {
    pub fn not_found(id: AnalysisId) -> Self {
        AnalysisError::NotFound(id)
    }
    pub fn document_not_found(id: DocumentId) -> Self {
        AnalysisError::DocumentNotFound(id)
    }
    pub fn invalid_state(message: impl Into<String>) -> Self {
        AnalysisError::InvalidState(message.into())
    }
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        AnalysisError::ValidationFailed {
            field: field.into(),
            message: message.into(),
        }
    }
    pub fn infrastructure(message: impl Into<String>) -> Self {
        AnalysisError::Infrastructure(message.into())
    }
    pub fn code(&self) -> ErrorCode {
        match self {
            AnalysisError::NotFound(_) => ErrorCode::AnalysisNotFound,
            AnalysisError::DocumentNotFound(_) => ErrorCode::DocumentNotFound,
            AnalysisError::InvalidState(_) => ErrorCode::InvalidStateTransition,
            AnalysisError::QueueFull => ErrorCode::QueueFull,
            AnalysisError::ValidationFailed { .. } => ErrorCode::ValidationFailed,
            AnalysisError::Infrastructure(_) => ErrorCode::DatabaseError,
        }
    }
    pub fn message(&self) -> String {
        match self {
            AnalysisError::NotFound(id) => format!("Analysis not found: {}", id),
            AnalysisError::DocumentNotFound(id) => format!("Document not found: {}", id),
            AnalysisError::InvalidState(msg) => format!("Invalid state: {}", msg),
            AnalysisError::QueueFull => "Analysis queue is full, retry later".to_string(),
            AnalysisError::ValidationFailed { field, message } => {
                format!("Validation failed for '{}': {}", field, message)
            }
            AnalysisError::Infrastructure(msg) => format!("Error: {}", msg),
        }
    }
}

impl std::fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for AnalysisError {}

impl From<DomainError> for AnalysisError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::QueueFull => AnalysisError::QueueFull,
            ErrorCode::InvalidStateTransition | ErrorCode::AnalysisAlreadyFinalized => {
                AnalysisError::InvalidState(err.message)
            }
            ErrorCode::ValidationFailed => AnalysisError::ValidationFailed {
                field: err
                    .details
                    .get("field")
                    .cloned()
                    .unwrap_or_else(|| "unknown".to_string()),
                message: err.message,
            },
            _ => AnalysisError::Infrastructure(err.to_string()),
        }
    }
}
