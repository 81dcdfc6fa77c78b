//! MetricSnapshot - one immutable extraction batch for a document.

use serde::{Deserialize, Serialize};

use super::Metric;
use crate::domain::foundation::{DocumentId, SnapshotId, Timestamp};

/// The metrics produced by one successful extraction of a document.
///
/// Snapshots are never mutated after being recorded. Analyses read the most
/// recent one, so concurrent runs against the same document share it without
/// locking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSnapshot {
    pub id: SnapshotId,
    pub document_id: DocumentId,
    pub metrics: Vec<Metric>,
    /// Overall extraction confidence reported by the extractor.
    pub confidence: f64,
    pub extracted_at: Timestamp,
}

impl MetricSnapshot {
    /// Creates a snapshot stamped with the current time.
    pub fn new(document_id: DocumentId, metrics: Vec<Metric>, confidence: f64) -> Self {
        Self {
            id: SnapshotId::new(),
            document_id,
            metrics,
            confidence,
            extracted_at: Timestamp::now(),
        }
    }

    /// Returns every metric carrying the given name.
    pub fn find<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Metric> + 'a {
        self.metrics.iter().filter(move |m| m.name() == name)
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }
}
