//! MetricStore port - Extracted metric snapshots per document.
//!
//! Snapshots are append-only: extraction records a new one, analyses read
//! the most recent. Nothing in the pipeline mutates a recorded snapshot.

use async_trait::async_trait;

use crate::domain::foundation::{DocumentId, DomainError};
use crate::domain::metric::MetricSnapshot;

/// Port for metric snapshot storage.
#[async_trait]
pub trait MetricStore: Send + Sync {
    /// Most recent successful extraction for a document.
    ///
    /// Returns `None` if the document has never been extracted.
    async fn latest_snapshot(
        &self,
        document_id: &DocumentId,
    ) -> Result<Option<MetricSnapshot>, DomainError>;

    /// Record a new extraction batch.
    ///
    /// # Errors
    ///
    /// - `DatabaseError` on persistence failure
    async fn record_snapshot(&self, snapshot: &MetricSnapshot) -> Result<(), DomainError>;
}
