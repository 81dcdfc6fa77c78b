//! In-memory DocumentRepository.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::document::{Document, DocumentStatus};
use crate::domain::foundation::{DocumentId, DomainError, ErrorCode};
use crate::ports::DocumentRepository;

/// In-memory storage for documents.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDocumentRepository {
    documents: Arc<RwLock<HashMap<DocumentId, Document>>>,
}

impl InMemoryDocumentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove a document (simulates deletion by the CRUD layer).
    pub async fn remove(&self, id: &DocumentId) -> Option<Document> {
        self.documents.write().await.remove(id)
    }
}

#[async_trait]
impl DocumentRepository for InMemoryDocumentRepository {
    async fn save(&self, document: &Document) -> Result<(), DomainError> {
        self.documents
            .write()
            .await
            .insert(*document.id(), document.clone());
        Ok(())
    }

    async fn update(&self, document: &Document) -> Result<(), DomainError> {
        let mut documents = self.documents.write().await;
        match documents.get_mut(document.id()) {
            Some(stored) => {
                *stored = document.clone();
                Ok(())
            }
            None => Err(DomainError::new(
                ErrorCode::DocumentNotFound,
                format!("Document not found: {}", document.id()),
            )),
        }
    }

    async fn find_by_id(&self, id: &DocumentId) -> Result<Option<Document>, DomainError> {
        Ok(self.documents.read().await.get(id).cloned())
    }

    async fn list_by_status(
        &self,
        status: DocumentStatus,
        limit: u32,
    ) -> Result<Vec<Document>, DomainError> {
        let documents = self.documents.read().await;
        let mut found: Vec<Document> = documents
            .values()
            .filter(|d| d.status() == status)
            .cloned()
            .collect();
        found.sort_by(|a, b| {
            a.uploaded_at()
                .cmp(b.uploaded_at())
                .then_with(|| a.id().cmp(b.id()))
        });
        found.truncate(limit as usize);
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::document::{DocumentStatus, FileType};
    use crate::domain::foundation::UserId;

    fn document() -> Document {
        Document::upload(UserId::new("user-1").unwrap(), "10k.pdf", FileType::Pdf).unwrap()
    }

    #[tokio::test]
    async fn save_then_find_returns_document() {
        let repo = InMemoryDocumentRepository::new();
        let doc = document();
        repo.save(&doc).await.unwrap();

        let found = repo.find_by_id(doc.id()).await.unwrap();
        assert_eq!(found, Some(doc));
    }

    #[tokio::test]
    async fn update_persists_status_change() {
        let repo = InMemoryDocumentRepository::new();
        let mut doc = document();
        repo.save(&doc).await.unwrap();

        doc.start_processing().unwrap();
        repo.update(&doc).await.unwrap();

        let found = repo.find_by_id(doc.id()).await.unwrap().unwrap();
        assert_eq!(found.status(), DocumentStatus::Processing);
    }

    #[tokio::test]
    async fn update_of_unknown_document_is_not_found() {
        let repo = InMemoryDocumentRepository::new();
        let err = repo.update(&document()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::DocumentNotFound);
    }

    #[tokio::test]
    async fn list_by_status_filters_and_limits() {
        let repo = InMemoryDocumentRepository::new();
        let uploaded = document();
        let mut processing = document();
        processing.start_processing().unwrap();
        repo.save(&uploaded).await.unwrap();
        repo.save(&processing).await.unwrap();

        let found = repo.list_by_status(DocumentStatus::Uploaded, 10).await.unwrap();
        assert_eq!(found, vec![uploaded]);
        assert!(repo
            .list_by_status(DocumentStatus::Uploaded, 0)
            .await
            .unwrap()
            .is_empty());
    }
}
