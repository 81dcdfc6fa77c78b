//! In-memory MetricStore.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::{DocumentId, DomainError};
use crate::domain::metric::MetricSnapshot;
use crate::ports::MetricStore;

/// Append-only snapshot log per document.
#[derive(Debug, Clone, Default)]
pub struct InMemoryMetricStore {
    snapshots: Arc<RwLock<HashMap<DocumentId, Vec<MetricSnapshot>>>>,
}

impl InMemoryMetricStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of snapshots recorded for a document.
    pub async fn snapshot_count(&self, document_id: &DocumentId) -> usize {
        self.snapshots
            .read()
            .await
            .get(document_id)
            .map_or(0, Vec::len)
    }
}

#[async_trait]
impl MetricStore for InMemoryMetricStore {
    async fn latest_snapshot(
        &self,
        document_id: &DocumentId,
    ) -> Result<Option<MetricSnapshot>, DomainError> {
        let snapshots = self.snapshots.read().await;
        Ok(snapshots
            .get(document_id)
            .and_then(|log| log.last())
            .cloned())
    }

    async fn record_snapshot(&self, snapshot: &MetricSnapshot) -> Result<(), DomainError> {
        self.snapshots
            .write()
            .await
            .entry(snapshot.document_id)
            .or_default()
            .push(snapshot.clone());
        Ok(())
    }
}
