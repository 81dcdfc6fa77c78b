//! Integration tests for the analysis pipeline.
//!
//! These tests drive the public API end to end:
//! 1. A handler creates a RUNNING analysis and queues it on the worker pool
//! 2. A worker runs the orchestrator (metrics, enrichment, evaluation, alerts)
//! 3. The analysis ends COMPLETED or FAILED and is observed by polling
//!
//! Uses the in-memory adapters so no database or remote service is needed.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use finwatch::adapters::enrichment::MockEnrichmentProvider;
use finwatch::adapters::extraction::PatternMetricExtractor;
use finwatch::adapters::memory::{
    InMemoryAlertRepository, InMemoryAnalysisRepository, InMemoryConstraintStore,
    InMemoryDocumentRepository, InMemoryMetricStore,
};
use finwatch::application::{
    AnalysisOrchestrator, AnalysisView, AnalysisWorkerPool, ExtractDocumentCommand,
    ExtractDocumentHandler, GetAnalysisHandler, IntakeConfig, ListAnalysesHandler,
    OrchestratorConfig, PipelineIntake, RerunAnalysisCommand, RerunAnalysisHandler,
    StartAnalysisCommand, StartAnalysisHandler, WorkerPoolConfig,
};
use finwatch::domain::alert::Alert;
use finwatch::domain::analysis::{Analysis, AnalysisStatus, RerunConstraintPolicy};
use finwatch::domain::constraint::{Constraint, Operator, Severity};
use finwatch::domain::document::{Document, DocumentStatus, FileType};
use finwatch::domain::foundation::{
    AnalysisId, ConstraintId, DocumentId, DomainError, ErrorCode, UserId,
};
use finwatch::domain::metric::{Metric, MetricSnapshot};
use finwatch::ports::{
    AlertRepository, AnalysisRepository, DocumentRepository, EnrichmentProvider, MetricStore,
};

// =============================================================================
// Test Infrastructure
// =============================================================================

/// Alert store that rejects every write.
struct BrokenAlertRepository;

#[async_trait]
impl AlertRepository for BrokenAlertRepository {
    async fn save_alerts(&self, _: &AnalysisId, _: &[Alert]) -> Result<(), DomainError> {
        Err(DomainError::new(ErrorCode::DatabaseError, "alerts table unavailable"))
    }

    async fn find_by_analysis(&self, _: &AnalysisId) -> Result<Vec<Alert>, DomainError> {
        Ok(Vec::new())
    }

    async fn count_by_analysis(&self, _: &AnalysisId) -> Result<u64, DomainError> {
        Ok(0)
    }
}

struct Pipeline {
    analyses: InMemoryAnalysisRepository,
    documents: InMemoryDocumentRepository,
    metrics: InMemoryMetricStore,
    constraints: InMemoryConstraintStore,
    alerts: Arc<dyn AlertRepository>,
    pool: Arc<AnalysisWorkerPool>,
    owner: UserId,
}

struct PipelineBuilder {
    alerts: Option<Arc<dyn AlertRepository>>,
    enrichment: Option<Arc<dyn EnrichmentProvider>>,
    enrichment_timeout: Duration,
    worker_count: usize,
}

impl PipelineBuilder {
    fn new() -> Self {
        Self {
            alerts: None,
            enrichment: None,
            enrichment_timeout: Duration::from_secs(5),
            worker_count: 2,
        }
    }

    fn alerts(mut self, alerts: Arc<dyn AlertRepository>) -> Self {
        self.alerts = Some(alerts);
        self
    }

    fn enrichment(mut self, provider: Arc<dyn EnrichmentProvider>, timeout: Duration) -> Self {
        self.enrichment = Some(provider);
        self.enrichment_timeout = timeout;
        self
    }

    fn workers(mut self, worker_count: usize) -> Self {
        self.worker_count = worker_count;
        self
    }

    fn build(self) -> Pipeline {
        let analyses = InMemoryAnalysisRepository::new();
        let documents = InMemoryDocumentRepository::new();
        let metrics = InMemoryMetricStore::new();
        let constraints = InMemoryConstraintStore::new();
        let alerts = self
            .alerts
            .unwrap_or_else(|| Arc::new(InMemoryAlertRepository::new()));

        let mut orchestrator = AnalysisOrchestrator::new(
            Arc::new(analyses.clone()),
            Arc::new(documents.clone()),
            Arc::new(metrics.clone()),
            Arc::new(constraints.clone()),
            Arc::clone(&alerts),
            OrchestratorConfig {
                enrichment_timeout: self.enrichment_timeout,
            },
        );
        if let Some(provider) = self.enrichment {
            orchestrator = orchestrator.with_enrichment(provider);
        }

        let pool = AnalysisWorkerPool::start(
            Arc::new(orchestrator),
            WorkerPoolConfig {
                worker_count: self.worker_count,
                queue_capacity: 32,
            },
        );

        Pipeline {
            analyses,
            documents,
            metrics,
            constraints,
            alerts,
            pool: Arc::new(pool),
            owner: UserId::new("analyst-1").unwrap(),
        }
    }
}

impl Pipeline {
    async fn upload(&self) -> DocumentId {
        let doc = Document::upload(self.owner.clone(), "acme-10k.txt", FileType::Text).unwrap();
        self.documents.save(&doc).await.unwrap();
        *doc.id()
    }

    async fn record_metrics(&self, document_id: DocumentId, metrics: &[(&str, f64)]) {
        let metrics = metrics
            .iter()
            .map(|(name, value)| Metric::new(*name, *value).unwrap())
            .collect();
        self.metrics
            .record_snapshot(&MetricSnapshot::new(document_id, metrics, 0.9))
            .await
            .unwrap();
    }

    async fn rule(&self, metric: &str, operator: Operator, threshold: f64, severity: Severity) -> ConstraintId {
        let id = ConstraintId::new();
        let constraint = Constraint::new(
            id,
            self.owner.clone(),
            format!("{} rule", metric),
            metric,
            operator,
            threshold,
            severity,
        )
        .unwrap();
        self.constraints.upsert(constraint).await;
        id
    }

    fn start_handler(&self) -> StartAnalysisHandler {
        StartAnalysisHandler::new(Arc::new(self.analyses.clone()), self.pool.clone())
    }

    fn rerun_handler(&self, policy: RerunConstraintPolicy) -> RerunAnalysisHandler {
        RerunAnalysisHandler::new(
            Arc::new(self.analyses.clone()),
            Arc::new(self.documents.clone()),
            Arc::new(self.constraints.clone()),
            self.pool.clone(),
            policy,
        )
    }

    fn get_handler(&self) -> GetAnalysisHandler {
        GetAnalysisHandler::new(Arc::new(self.analyses.clone()), Arc::clone(&self.alerts))
    }

    async fn start(&self, document_id: DocumentId, constraint_ids: Vec<ConstraintId>, enrich: bool) -> AnalysisId {
        self.start_handler()
            .handle(StartAnalysisCommand {
                document_id,
                constraint_ids,
                enrich,
            })
            .await
            .unwrap()
    }

    async fn stored(&self, id: AnalysisId) -> Analysis {
        self.analyses.find_by_id(&id).await.unwrap().unwrap()
    }

    /// Polls until the analysis leaves RUNNING.
    async fn wait_terminal(&self, id: AnalysisId) -> AnalysisView {
        let handler = self.get_handler();
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                let view = handler.handle(id).await.unwrap();
                if view.status != AnalysisStatus::Running {
                    return view;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("analysis did not finish in time")
    }

    async fn shutdown(&self) {
        assert!(self.pool.shutdown(Duration::from_secs(2)).await);
    }
}

// =============================================================================
// End-to-end runs
// =============================================================================

#[tokio::test]
async fn leverage_breach_raises_one_critical_alert() {
    let p = PipelineBuilder::new().build();
    let doc = p.upload().await;
    p.record_metrics(doc, &[("debt_to_equity", 2.5), ("current_ratio", 1.8)]).await;
    let leverage = p.rule("debt_to_equity", Operator::LessOrEqual, 2.0, Severity::Critical).await;
    let liquidity = p.rule("current_ratio", Operator::GreaterOrEqual, 1.0, Severity::Warning).await;

    let id = p.start(doc, vec![leverage, liquidity], false).await;
    let view = p.wait_terminal(id).await;

    assert_eq!(view.status, AnalysisStatus::Completed);
    assert!(view.completed_at.is_some());
    assert!(view.error_message.is_none());
    assert_eq!(view.alert_count, 1);

    let alerts = p.alerts.find_by_analysis(&id).await.unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].constraint_id, leverage);
    assert_eq!(alerts[0].severity, Severity::Critical);
    assert_eq!(alerts[0].actual_value, 2.5);
    assert_eq!(alerts[0].expected_value, 2.0);
    assert!(!alerts[0].acknowledged);

    p.shutdown().await;
}

#[tokio::test]
async fn document_without_metrics_fails_with_message() {
    let p = PipelineBuilder::new().build();
    let doc = p.upload().await;
    let rule = p.rule("eps", Operator::GreaterThan, 0.0, Severity::Info).await;

    let id = p.start(doc, vec![rule], false).await;
    let view = p.wait_terminal(id).await;

    assert_eq!(view.status, AnalysisStatus::Failed);
    assert!(view.completed_at.is_some());
    let message = view.error_message.unwrap();
    assert!(message.contains("NO_METRICS_AVAILABLE"), "got {}", message);
    assert_eq!(view.alert_count, 0);

    p.shutdown().await;
}

#[tokio::test]
async fn slow_enrichment_times_out_but_analysis_completes() {
    let provider = MockEnrichmentProvider::new().with_delay(Duration::from_secs(10));
    let p = PipelineBuilder::new()
        .enrichment(Arc::new(provider.clone()), Duration::from_millis(50))
        .build();
    let doc = p.upload().await;
    p.record_metrics(doc, &[("roe", 4.0)]).await;
    let rule = p.rule("roe", Operator::GreaterOrEqual, 10.0, Severity::Warning).await;

    let id = p.start(doc, vec![rule], true).await;
    let view = p.wait_terminal(id).await;

    assert_eq!(view.status, AnalysisStatus::Completed);
    assert_eq!(view.alert_count, 1);
    assert_eq!(provider.call_count(), 1);

    let stored = p.stored(id).await;
    let blob = stored.enrichment().unwrap();
    assert_eq!(blob["provider"], "mock");
    assert!(blob["error"].as_str().unwrap().contains("timed out"));

    p.shutdown().await;
}

#[tokio::test]
async fn alert_store_failure_fails_the_analysis() {
    let p = PipelineBuilder::new()
        .alerts(Arc::new(BrokenAlertRepository))
        .build();
    let doc = p.upload().await;
    p.record_metrics(doc, &[("net_margin", -3.0)]).await;
    let rule = p.rule("net_margin", Operator::GreaterThan, 0.0, Severity::Critical).await;

    let id = p.start(doc, vec![rule], false).await;
    let view = p.wait_terminal(id).await;

    assert_eq!(view.status, AnalysisStatus::Failed);
    assert!(view.error_message.unwrap().contains("alerts table unavailable"));

    p.shutdown().await;
}

#[tokio::test]
async fn concurrent_analyses_of_one_document_are_independent() {
    let p = PipelineBuilder::new().workers(4).build();
    let doc = p.upload().await;
    p.record_metrics(doc, &[("pe_ratio", 45.0)]).await;
    let rule = p.rule("pe_ratio", Operator::LessThan, 30.0, Severity::Warning).await;

    let mut ids = Vec::new();
    for _ in 0..6 {
        ids.push(p.start(doc, vec![rule], false).await);
    }
    for id in &ids {
        let view = p.wait_terminal(*id).await;
        assert_eq!(view.status, AnalysisStatus::Completed);
        assert_eq!(view.alert_count, 1);
    }

    let listed = ListAnalysesHandler::new(Arc::new(p.analyses.clone()), Arc::clone(&p.alerts))
        .handle(doc)
        .await
        .unwrap();
    assert_eq!(listed.len(), 6);
    assert!(listed
        .windows(2)
        .all(|pair| pair[0].started_at >= pair[1].started_at));

    p.shutdown().await;
}

// =============================================================================
// Reruns
// =============================================================================

#[tokio::test]
async fn frozen_rerun_reuses_previous_constraints() {
    let p = PipelineBuilder::new().build();
    let doc = p.upload().await;
    p.record_metrics(doc, &[("debt_to_equity", 2.5)]).await;
    let rule = p.rule("debt_to_equity", Operator::LessOrEqual, 2.0, Severity::Critical).await;
    let first = p.start(doc, vec![rule], false).await;
    p.wait_terminal(first).await;

    // a rule added later is not part of a frozen rerun
    p.rule("debt_to_equity", Operator::LessThan, 1.0, Severity::Info).await;

    let rerun = p
        .rerun_handler(RerunConstraintPolicy::Frozen)
        .handle(RerunAnalysisCommand {
            analysis_id: first,
            enrich: None,
        })
        .await
        .unwrap();
    let view = p.wait_terminal(rerun).await;

    assert_eq!(view.rerun_of, Some(first));
    assert_eq!(view.status, AnalysisStatus::Completed);
    assert_eq!(view.alert_count, 1);

    p.shutdown().await;
}

#[tokio::test]
async fn reresolved_rerun_picks_up_new_constraints() {
    let p = PipelineBuilder::new().build();
    let doc = p.upload().await;
    p.record_metrics(doc, &[("debt_to_equity", 2.5)]).await;
    let rule = p.rule("debt_to_equity", Operator::LessOrEqual, 2.0, Severity::Critical).await;
    let first = p.start(doc, vec![rule], false).await;
    p.wait_terminal(first).await;

    p.rule("debt_to_equity", Operator::LessThan, 1.0, Severity::Info).await;

    let rerun = p
        .rerun_handler(RerunConstraintPolicy::Reresolve)
        .handle(RerunAnalysisCommand {
            analysis_id: first,
            enrich: None,
        })
        .await
        .unwrap();
    let view = p.wait_terminal(rerun).await;

    assert_eq!(view.status, AnalysisStatus::Completed);
    assert_eq!(view.alert_count, 2);

    p.shutdown().await;
}

// =============================================================================
// Extraction feeding analysis
// =============================================================================

#[tokio::test]
async fn extracted_text_filing_is_analysed() {
    let p = PipelineBuilder::new().build();
    let doc = p.upload().await;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("acme-10k.txt");
    std::fs::write(
        &path,
        "ACME Corp annual report\nDebt to Equity: 3.1\nCurrent Ratio: 0.9\n",
    )
    .unwrap();

    let extraction = ExtractDocumentHandler::new(
        Arc::new(p.documents.clone()),
        Arc::new(p.metrics.clone()),
        Arc::new(PatternMetricExtractor::new()),
    )
    .handle(ExtractDocumentCommand::from_path(doc, &path).unwrap())
    .await
    .unwrap();
    assert_eq!(extraction.metric_count, 2);

    let stored = p.documents.find_by_id(&doc).await.unwrap().unwrap();
    assert_eq!(stored.status(), DocumentStatus::Processed);

    let leverage = p.rule("debt_to_equity", Operator::LessOrEqual, 2.0, Severity::Critical).await;
    let liquidity = p.rule("current_ratio", Operator::GreaterOrEqual, 1.0, Severity::Warning).await;
    let id = p.start(doc, vec![leverage, liquidity], false).await;
    let view = p.wait_terminal(id).await;

    assert_eq!(view.status, AnalysisStatus::Completed);
    assert_eq!(view.alert_count, 2);

    p.shutdown().await;
}

// =============================================================================
// Intake from storage
// =============================================================================

#[tokio::test]
async fn intake_extracts_upload_and_runs_stored_analysis() {
    let p = PipelineBuilder::new().build();
    let doc = p.upload().await;
    let leverage = p.rule("debt_to_equity", Operator::LessOrEqual, 2.0, Severity::Critical).await;

    let upload_dir = tempfile::tempdir().unwrap();
    let file_dir = upload_dir.path().join(doc.to_string());
    std::fs::create_dir_all(&file_dir).unwrap();
    std::fs::write(file_dir.join("acme-10k.txt"), "Debt to Equity: 2.7\n").unwrap();

    // Written by the CRUD layer, never submitted by a handler.
    let analysis = Analysis::start(doc, vec![leverage], false);
    p.analyses.create(&analysis).await.unwrap();

    let intake = PipelineIntake::new(
        Arc::new(p.analyses.clone()),
        Arc::new(p.documents.clone()),
        p.pool.clone(),
        IntakeConfig {
            poll_interval: Duration::from_millis(10),
            batch_size: 10,
            upload_dir: upload_dir.path().to_path_buf(),
        },
    )
    .with_extraction(ExtractDocumentHandler::new(
        Arc::new(p.documents.clone()),
        Arc::new(p.metrics.clone()),
        Arc::new(PatternMetricExtractor::new()),
    ));

    let report = intake.poll_once().await.unwrap();
    assert_eq!(report.extracted, 1);
    assert_eq!(report.submitted, 1);

    let view = p.wait_terminal(*analysis.id()).await;
    assert_eq!(view.status, AnalysisStatus::Completed);
    assert_eq!(view.alert_count, 1);

    let again = intake.poll_once().await.unwrap();
    assert_eq!(again.submitted, 0);

    p.shutdown().await;
}
