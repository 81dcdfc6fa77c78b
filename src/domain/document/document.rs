//! Document aggregate - an uploaded filing and its extraction status.
//!
//! A document's lifecycle is independent of any analysis. Analyses read the
//! metric snapshot left behind by its latest successful extraction.

use serde::{Deserialize, Serialize};

use super::{DocumentStatus, FileType};
use crate::domain::foundation::{
    DocumentId, DomainError, ErrorCode, StateMachine, Timestamp, UserId,
};

/// Document aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    id: DocumentId,
    owner_id: UserId,
    filename: String,
    file_type: FileType,
    status: DocumentStatus,
    uploaded_at: Timestamp,
    updated_at: Timestamp,
}

impl Document {
    /// Register a freshly uploaded document.
    ///
    /// # Errors
    ///
    /// - `ValidationFailed` if filename is empty
    pub fn upload(
        owner_id: UserId,
        filename: impl Into<String>,
        file_type: FileType,
    ) -> Result<Self, DomainError> {
        let filename = filename.into();
        if filename.trim().is_empty() {
            return Err(DomainError::validation("filename", "Filename cannot be empty"));
        }

        let now = Timestamp::now();
        Ok(Self {
            id: DocumentId::new(),
            owner_id,
            filename,
            file_type,
            status: DocumentStatus::Uploaded,
            uploaded_at: now,
            updated_at: now,
        })
    }

    /// Reconstitute a document from persistence (no validation).
    pub fn reconstitute(
        id: DocumentId,
        owner_id: UserId,
        filename: String,
        file_type: FileType,
        status: DocumentStatus,
        uploaded_at: Timestamp,
        updated_at: Timestamp,
    ) -> Self {
        Self {
            id,
            owner_id,
            filename,
            file_type,
            status,
            uploaded_at,
            updated_at,
        }
    }

    pub fn id(&self) -> &DocumentId {
        &self.id
    }

    pub fn owner_id(&self) -> &UserId {
        &self.owner_id
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn file_type(&self) -> FileType {
        self.file_type
    }

    pub fn status(&self) -> DocumentStatus {
        self.status
    }

    pub fn uploaded_at(&self) -> &Timestamp {
        &self.uploaded_at
    }

    pub fn updated_at(&self) -> &Timestamp {
        &self.updated_at
    }

    /// Mark extraction as started.
    pub fn start_processing(&mut self) -> Result<(), DomainError> {
        self.transition(DocumentStatus::Processing)
    }

    /// Mark extraction as succeeded.
    pub fn mark_processed(&mut self) -> Result<(), DomainError> {
        self.transition(DocumentStatus::Processed)
    }

    /// Mark extraction as failed.
    pub fn mark_failed(&mut self) -> Result<(), DomainError> {
        self.transition(DocumentStatus::Failed)
    }

    fn transition(&mut self, target: DocumentStatus) -> Result<(), DomainError> {
        self.status = self.status.transition_to(target).map_err(|e| {
            DomainError::new(ErrorCode::InvalidStateTransition, e.to_string())
                .with_detail("document_id", self.id.to_string())
        })?;
        self.updated_at = Timestamp::now();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uploaded() -> Document {
        Document::upload(UserId::new("analyst").unwrap(), "10-K.pdf", FileType::Pdf).unwrap()
    }

    #[test]
    fn upload_starts_in_uploaded() {
        let doc = uploaded();
        assert_eq!(doc.status(), DocumentStatus::Uploaded);
        assert_eq!(doc.filename(), "10-K.pdf");
    }

    #[test]
    fn upload_rejects_empty_filename() {
        let result = Document::upload(UserId::new("analyst").unwrap(), " ", FileType::Csv);
        assert_eq!(result.unwrap_err().code, ErrorCode::ValidationFailed);
    }

    #[test]
    fn happy_path_reaches_processed() {
        let mut doc = uploaded();
        doc.start_processing().unwrap();
        doc.mark_processed().unwrap();
        assert_eq!(doc.status(), DocumentStatus::Processed);
    }

    #[test]
    fn cannot_mark_processed_without_processing() {
        let mut doc = uploaded();
        let err = doc.mark_processed().unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidStateTransition);
        assert_eq!(doc.status(), DocumentStatus::Uploaded);
    }
}
