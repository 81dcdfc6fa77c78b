//! Extraction Service Port - turns an uploaded filing into named metrics.
//!
//! The extractor is an external black box (a parser service or a local
//! pattern matcher). The document extraction handler owns the document
//! status transitions around it.

use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;

use crate::domain::document::FileType;
use crate::domain::foundation::DocumentId;
use crate::domain::metric::Metric;

/// Port for metric extraction.
#[async_trait]
pub trait ExtractionService: Send + Sync {
    /// Parse a stored file and return the metrics found in it.
    async fn extract(&self, request: &ExtractionRequest) -> Result<ExtractionOutput, ExtractionError>;

    /// Short name used in logs.
    fn name(&self) -> &'static str;
}

/// Request to extract one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionRequest {
    pub document_id: DocumentId,
    pub file_path: PathBuf,
    pub file_type: FileType,
}

/// Metrics found in a document.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionOutput {
    pub metrics: Vec<Metric>,
    /// Overall confidence in `[0, 1]` for this extraction.
    pub confidence: f64,
    /// Number of table-like regions the extractor recognised.
    pub tables_found: usize,
}

/// Errors from metric extraction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionError {
    /// File type cannot be handled by this extractor.
    #[error("unsupported file type: {0}")]
    UnsupportedFileType(String),

    /// Stored file does not exist.
    #[error("file not found: {0}")]
    FileNotFound(String),

    /// Extractor ran but reported failure.
    #[error("extraction failed: {0}")]
    ServiceFailure(String),

    /// Network error calling a remote extractor.
    #[error("network error: {0}")]
    Network(String),

    /// Response could not be decoded.
    #[error("parse error: {0}")]
    Parse(String),
}
