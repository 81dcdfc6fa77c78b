//! AnalysisOrchestrator - drives one analysis from RUNNING to a terminal state.
//!
//! Stages, in order:
//! 1. Metric retrieval from the latest snapshot of the document (required)
//! 2. Optional enrichment, bounded by a timeout (advisory)
//! 3. Constraint resolution and evaluation
//! 4. Alert materialization and persistence
//! 5. Finalization (write-once)
//!
//! Every stage error is captured into the analysis `error_message`; nothing
//! escapes to the caller that triggered the run. Enrichment errors are the
//! only ones swallowed. Alerts already persisted are never rolled back.
//!
//! The whole of stages 1-4 is raced against the run's `CancellationToken`,
//! so a storage call that never returns still ends the run FAILED once the
//! token trips.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::domain::alert::AlertMapper;
use crate::domain::analysis::Analysis;
use crate::domain::constraint::ConstraintEvaluator;
use crate::domain::foundation::{AnalysisId, DomainError, ErrorCode};
use crate::domain::metric::Metric;
use crate::ports::{
    AlertRepository, AnalysisRepository, ConstraintReader, DocumentRepository, EnrichmentError,
    EnrichmentProvider, EnrichmentRequest, MetricStore,
};

/// Executes analyses by id. Implemented by the orchestrator; the worker
/// pool only depends on this seam.
#[async_trait]
pub trait AnalysisRunner: Send + Sync {
    /// Run the analysis to a terminal state and return it.
    ///
    /// # Errors
    ///
    /// Only when the run could not own the analysis: it does not exist, it
    /// is already terminal, or its terminal state could not be written.
    async fn run(
        &self,
        analysis_id: AnalysisId,
        cancel: CancellationToken,
    ) -> Result<Analysis, DomainError>;

    /// Fail a RUNNING analysis whose run will never finish, e.g. because
    /// its worker was aborted. Unknown and terminal analyses are left alone.
    ///
    /// # Errors
    ///
    /// Only when the terminal state could not be written.
    async fn abandon(&self, analysis_id: AnalysisId, reason: &str) -> Result<(), DomainError>;
}

/// Orchestrator settings.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Upper bound on one enrichment call.
    pub enrichment_timeout: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            enrichment_timeout: Duration::from_secs(30),
        }
    }
}

/// The pipeline driver.
pub struct AnalysisOrchestrator {
    analyses: Arc<dyn AnalysisRepository>,
    documents: Arc<dyn DocumentRepository>,
    metrics: Arc<dyn MetricStore>,
    constraints: Arc<dyn ConstraintReader>,
    alerts: Arc<dyn AlertRepository>,
    enrichment: Option<Arc<dyn EnrichmentProvider>>,
    config: OrchestratorConfig,
}

impl AnalysisOrchestrator {
    pub fn new(
        analyses: Arc<dyn AnalysisRepository>,
        documents: Arc<dyn DocumentRepository>,
        metrics: Arc<dyn MetricStore>,
        constraints: Arc<dyn ConstraintReader>,
        alerts: Arc<dyn AlertRepository>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            analyses,
            documents,
            metrics,
            constraints,
            alerts,
            enrichment: None,
            config,
        }
    }

    /// Attach the enrichment collaborator.
    pub fn with_enrichment(mut self, provider: Arc<dyn EnrichmentProvider>) -> Self {
        self.enrichment = Some(provider);
        self
    }

    async fn run_owned(
        &self,
        analysis_id: AnalysisId,
        cancel: CancellationToken,
    ) -> Result<Analysis, DomainError> {
        let mut analysis = self
            .analyses
            .find_by_id(&analysis_id)
            .await?
            .ok_or_else(|| {
                DomainError::new(
                    ErrorCode::AnalysisNotFound,
                    format!("Analysis not found: {}", analysis_id),
                )
            })?;

        if analysis.is_finalized() {
            return Err(DomainError::new(
                ErrorCode::AnalysisAlreadyFinalized,
                format!("Analysis {} is already {}", analysis_id, analysis.status()),
            ));
        }

        debug!(document_id = %analysis.document_id(), "Analysis run started");

        let outcome = tokio::select! {
            biased;
            result = self.execute(&mut analysis, &cancel) => result,
            _ = cancel.cancelled() => Err(cancelled("while a stage was in progress")),
        };

        match outcome {
            Ok(alert_count) => {
                analysis.complete()?;
                self.analyses.finalize(&analysis).await?;
                info!(alert_count, "Analysis completed");
            }
            Err(err) => {
                analysis.fail(err.to_string())?;
                self.analyses.finalize(&analysis).await?;
                error!(code = %err.code, error = %err.message, "Analysis failed");
            }
        }

        Ok(analysis)
    }

    /// Stages 1-4. Returns the number of alerts persisted.
    async fn execute(
        &self,
        analysis: &mut Analysis,
        cancel: &CancellationToken,
    ) -> Result<usize, DomainError> {
        ensure_not_cancelled(cancel, "before metric retrieval")?;

        // 1. Metric retrieval
        let document_id = *analysis.document_id();
        if self.documents.find_by_id(&document_id).await?.is_none() {
            return Err(DomainError::new(
                ErrorCode::DocumentNotFound,
                format!("Document not found: {}", document_id),
            ));
        }

        let snapshot = self
            .metrics
            .latest_snapshot(&document_id)
            .await?
            .filter(|snapshot| !snapshot.is_empty())
            .ok_or_else(|| {
                DomainError::new(
                    ErrorCode::NoMetricsAvailable,
                    format!("No extracted metrics available for document {}", document_id),
                )
            })?;

        debug!(
            snapshot_id = %snapshot.id,
            metric_count = snapshot.len(),
            "Loaded metric snapshot"
        );
        let mut metrics = snapshot.metrics;

        // 2. Optional enrichment
        if analysis.enrich_requested() {
            ensure_not_cancelled(cancel, "before enrichment")?;
            self.enrich(analysis, &mut metrics, cancel).await?;
        }

        // 3. Evaluation
        ensure_not_cancelled(cancel, "before evaluation")?;
        let constraints = self.constraints.find_by_ids(analysis.constraint_ids()).await?;
        if constraints.len() < analysis.constraint_ids().len() {
            debug!(
                requested = analysis.constraint_ids().len(),
                resolved = constraints.len(),
                "Some constraints no longer exist and were skipped"
            );
        }
        let violations = ConstraintEvaluator::evaluate(&constraints, &metrics);

        // 4. Alert materialization
        ensure_not_cancelled(cancel, "before alert persistence")?;
        let alerts = AlertMapper::materialize(&violations, *analysis.id());
        debug!(
            violation_count = violations.len(),
            alert_count = alerts.len(),
            "Evaluated constraints"
        );
        self.alerts.save_alerts(analysis.id(), &alerts).await?;

        Ok(alerts.len())
    }

    /// Run the enrichment call. Only cancellation is an error here.
    async fn enrich(
        &self,
        analysis: &mut Analysis,
        metrics: &mut Vec<Metric>,
        cancel: &CancellationToken,
    ) -> Result<(), DomainError> {
        let Some(provider) = self.enrichment.as_ref() else {
            warn!("Enrichment requested but no provider is configured");
            return Ok(());
        };

        let request = EnrichmentRequest::new(*analysis.id(), *analysis.document_id(), metrics.clone());
        let timeout = self.config.enrichment_timeout;

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return Err(cancelled("during enrichment"));
            }
            result = tokio::time::timeout(timeout, provider.enrich(&request)) => {
                result.unwrap_or(Err(EnrichmentError::Timeout {
                    timeout_secs: timeout.as_secs(),
                }))
            }
        };

        match outcome {
            Ok(result) => {
                debug!(
                    provider = provider.name(),
                    additional_metrics = result.additional_metrics.len(),
                    "Enrichment succeeded"
                );
                analysis.record_enrichment(result.to_blob(provider.name()))?;
                metrics.extend(result.additional_metrics);
            }
            Err(err) => {
                warn!(
                    provider = provider.name(),
                    error = %err,
                    "Enrichment failed, continuing with unenriched metrics"
                );
                analysis.record_enrichment(json!({
                    "provider": provider.name(),
                    "error": err.to_string(),
                }))?;
            }
        }

        Ok(())
    }
}

#[async_trait]
impl AnalysisRunner for AnalysisOrchestrator {
    async fn run(
        &self,
        analysis_id: AnalysisId,
        cancel: CancellationToken,
    ) -> Result<Analysis, DomainError> {
        let span = info_span!("analysis_run", analysis_id = %analysis_id);
        self.run_owned(analysis_id, cancel).instrument(span).await
    }

    async fn abandon(&self, analysis_id: AnalysisId, reason: &str) -> Result<(), DomainError> {
        let Some(mut analysis) = self.analyses.find_by_id(&analysis_id).await? else {
            return Ok(());
        };
        if analysis.is_finalized() {
            return Ok(());
        }

        analysis.fail(cancelled(reason).to_string())?;
        match self.analyses.finalize(&analysis).await {
            Ok(()) => {
                warn!(analysis_id = %analysis_id, reason, "Abandoned analysis marked failed");
                Ok(())
            }
            Err(err) if err.code == ErrorCode::AnalysisAlreadyFinalized => Ok(()),
            Err(err) => Err(err),
        }
    }
}

fn cancelled(stage: &str) -> DomainError {
    DomainError::new(ErrorCode::Cancelled, format!("analysis cancelled: {}", stage))
}

fn ensure_not_cancelled(cancel: &CancellationToken, stage: &str) -> Result<(), DomainError> {
    if cancel.is_cancelled() {
        return Err(cancelled(stage));
    }
    Ok(())
}
