//! Document repository port.

use async_trait::async_trait;

use crate::domain::document::{Document, DocumentStatus};
use crate::domain::foundation::{DocumentId, DomainError};

/// Repository port for Document persistence.
#[async_trait]
pub trait DocumentRepository: Send + Sync {
    /// Save a newly uploaded document.
    async fn save(&self, document: &Document) -> Result<(), DomainError>;

    /// Persist a status change.
    ///
    /// # Errors
    ///
    /// - `DocumentNotFound` if the document doesn't exist
    /// - `DatabaseError` on persistence failure
    async fn update(&self, document: &Document) -> Result<(), DomainError>;

    /// Find a document by id.
    async fn find_by_id(&self, id: &DocumentId) -> Result<Option<Document>, DomainError>;

    /// Documents in `status`, oldest upload first, at most `limit` of them.
    async fn list_by_status(
        &self,
        status: DocumentStatus,
        limit: u32,
    ) -> Result<Vec<Document>, DomainError>;
}
