//! ExtractDocumentHandler - runs metric extraction for an uploaded document.
//!
//! Owns the document status around the extractor call:
//! Uploaded/Processed/Failed -> Processing -> Processed | Failed.
//! A successful run records a new immutable metric snapshot that later
//! analyses read. An extraction that finds no metrics records nothing, so
//! the previous snapshot (if any) stays the latest.

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use crate::domain::document::{Document, FileType};
use crate::domain::foundation::{DocumentId, DomainError, ErrorCode, SnapshotId, ValidationError};
use crate::domain::metric::MetricSnapshot;
use crate::ports::{
    DocumentRepository, ExtractionError, ExtractionRequest, ExtractionService, MetricStore,
};

/// Command to extract metrics from a stored file.
#[derive(Debug, Clone)]
pub struct ExtractDocumentCommand {
    pub document_id: DocumentId,
    pub file_path: PathBuf,
    pub file_type: FileType,
}

impl ExtractDocumentCommand {
    /// Builds a command whose file type comes from the path's extension.
    ///
    /// # Errors
    ///
    /// - `InvalidFormat` if the extension is missing or unsupported
    pub fn from_path(
        document_id: DocumentId,
        file_path: impl Into<PathBuf>,
    ) -> Result<Self, ValidationError> {
        let file_path = file_path.into();
        let file_type = FileType::from_path(&file_path)?;
        Ok(Self {
            document_id,
            file_path,
            file_type,
        })
    }
}

/// Outcome of a successful extraction.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractDocumentResult {
    /// `None` when the extractor found no metrics.
    pub snapshot_id: Option<SnapshotId>,
    pub metric_count: usize,
    pub confidence: f64,
    pub tables_found: usize,
}

/// Errors from document extraction.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExtractDocumentError {
    #[error("Document not found: {0}")]
    NotFound(DocumentId),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error("Error: {0}")]
    Infrastructure(String),
}

impl ExtractDocumentError {
    pub fn code(&self) -> ErrorCode {
        match self {
            ExtractDocumentError::NotFound(_) => ErrorCode::DocumentNotFound,
            ExtractDocumentError::InvalidState(_) => ErrorCode::InvalidStateTransition,
            ExtractDocumentError::Extraction(_) => ErrorCode::ExtractionFailed,
            ExtractDocumentError::Infrastructure(_) => ErrorCode::DatabaseError,
        }
    }
}

impl From<DomainError> for ExtractDocumentError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::InvalidStateTransition => ExtractDocumentError::InvalidState(err.message),
            _ => ExtractDocumentError::Infrastructure(err.to_string()),
        }
    }
}

/// Handler for document extraction.
pub struct ExtractDocumentHandler {
    documents: Arc<dyn DocumentRepository>,
    metrics: Arc<dyn MetricStore>,
    extractor: Arc<dyn ExtractionService>,
}

impl ExtractDocumentHandler {
    pub fn new(
        documents: Arc<dyn DocumentRepository>,
        metrics: Arc<dyn MetricStore>,
        extractor: Arc<dyn ExtractionService>,
    ) -> Self {
        Self {
            documents,
            metrics,
            extractor,
        }
    }

    pub async fn handle(
        &self,
        cmd: ExtractDocumentCommand,
    ) -> Result<ExtractDocumentResult, ExtractDocumentError> {
        // 1. Load and claim the document
        let mut document = self
            .documents
            .find_by_id(&cmd.document_id)
            .await?
            .ok_or(ExtractDocumentError::NotFound(cmd.document_id))?;

        document.start_processing()?;
        self.documents.update(&document).await?;

        // 2. Extract
        let request = ExtractionRequest {
            document_id: cmd.document_id,
            file_path: cmd.file_path,
            file_type: cmd.file_type,
        };
        let output = match self.extractor.extract(&request).await {
            Ok(output) => output,
            Err(err) => {
                warn!(
                    document_id = %cmd.document_id,
                    extractor = self.extractor.name(),
                    error = %err,
                    "Extraction failed"
                );
                self.mark_failed(&mut document).await?;
                return Err(err.into());
            }
        };

        // 3. Record snapshot
        let snapshot = MetricSnapshot::new(cmd.document_id, output.metrics, output.confidence);
        let snapshot_id = if snapshot.is_empty() {
            warn!(
                document_id = %cmd.document_id,
                extractor = self.extractor.name(),
                "Extraction found no metrics, keeping previous snapshot"
            );
            None
        } else {
            if let Err(err) = self.metrics.record_snapshot(&snapshot).await {
                self.mark_failed(&mut document).await?;
                return Err(err.into());
            }
            Some(snapshot.id)
        };

        document.mark_processed()?;
        self.documents.update(&document).await?;

        info!(
            document_id = %cmd.document_id,
            metric_count = snapshot.len(),
            confidence = snapshot.confidence,
            "Document processed"
        );

        Ok(ExtractDocumentResult {
            snapshot_id,
            metric_count: snapshot.len(),
            confidence: snapshot.confidence,
            tables_found: output.tables_found,
        })
    }

    async fn mark_failed(&self, document: &mut Document) -> Result<(), ExtractDocumentError> {
        document.mark_failed()?;
        self.documents.update(document).await?;
        Ok(())
    }
}
