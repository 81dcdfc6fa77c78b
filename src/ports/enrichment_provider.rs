//! Enrichment Provider Port - optional augmentation of a metric set.
//!
//! Enrichment is advisory. The orchestrator bounds every call with a
//! timeout and treats any error here as a soft failure: it logs it and
//! evaluates the unenriched metrics.
//!
//! # Example
//!
//! ```ignore
//! let request = EnrichmentRequest::new(analysis_id, document_id, metrics);
//! match provider.enrich(&request).await {
//!     Ok(result) => metrics.extend(result.additional_metrics),
//!     Err(e) => tracing::warn!(error = %e, "enrichment skipped"),
//! }
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::foundation::{AnalysisId, DocumentId};
use crate::domain::metric::Metric;

/// Port for enrichment services (e.g. AI-derived insights).
#[async_trait]
pub trait EnrichmentProvider: Send + Sync {
    /// Produce insights and extra metrics for a metric set.
    async fn enrich(&self, request: &EnrichmentRequest) -> Result<EnrichmentResult, EnrichmentError>;

    /// Provider name for logs and the stored blob.
    fn name(&self) -> &str;
}

/// Input to an enrichment call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichmentRequest {
    pub analysis_id: AnalysisId,
    pub document_id: DocumentId,
    pub metrics: Vec<Metric>,
}

impl EnrichmentRequest {
    pub fn new(analysis_id: AnalysisId, document_id: DocumentId, metrics: Vec<Metric>) -> Self {
        Self {
            analysis_id,
            document_id,
            metrics,
        }
    }
}

/// Output of a successful enrichment call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnrichmentResult {
    /// Narrative insights, opaque to the pipeline.
    #[serde(default)]
    pub insights: serde_json::Value,
    /// Derived metrics appended to the evaluated set.
    #[serde(default)]
    pub additional_metrics: Vec<Metric>,
}

impl EnrichmentResult {
    /// Blob stored on the analysis.
    pub fn to_blob(&self, provider: &str) -> serde_json::Value {
        serde_json::json!({
            "provider": provider,
            "insights": self.insights,
            "additional_metric_count": self.additional_metrics.len(),
        })
    }
}

/// Errors from enrichment providers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnrichmentError {
    /// Request exceeded the configured bound.
    #[error("enrichment timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// Provider is unavailable.
    #[error("provider unavailable: {0}")]
    Unavailable(String),

    /// Rate limited by provider.
    #[error("rate limited: retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u32 },

    /// API key rejected.
    #[error("authentication failed")]
    AuthenticationFailed,

    /// Network error during request.
    #[error("network error: {0}")]
    Network(String),

    /// Provider response could not be decoded.
    #[error("parse error: {0}")]
    Parse(String),
}
