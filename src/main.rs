//! Finwatch analysis worker.
//!
//! Connects to PostgreSQL, starts the analysis worker pool and the intake
//! that feeds it, and runs until Ctrl-C or SIGTERM. The intake extracts
//! uploaded documents and submits RUNNING analyses written by the upload
//! and CRUD layer, including ones left over from a previous process.
//! On shutdown the intake stops first, then in-flight analyses drain.

use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use finwatch::adapters::enrichment::HttpEnrichmentProvider;
use finwatch::adapters::extraction::{HttpExtractionService, PatternMetricExtractor};
use finwatch::adapters::postgres::{
    PostgresAlertRepository, PostgresAnalysisRepository, PostgresConstraintReader,
    PostgresDocumentRepository, PostgresMetricStore,
};
use finwatch::application::{
    AnalysisOrchestrator, AnalysisWorkerPool, ExtractDocumentHandler, PipelineIntake,
};
use finwatch::config::{AppConfig, ExtractionConfig, RuntimeConfig};
use finwatch::ports::{AnalysisRepository, DocumentRepository, ExtractionService, MetricStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("Failed to load configuration")?;
    init_tracing(&config.runtime);
    config.validate().context("Invalid configuration")?;

    info!(
        environment = ?config.runtime.environment,
        workers = config.pipeline.worker_count,
        queue_capacity = config.pipeline.queue_capacity,
        rerun_policy = %config.pipeline.rerun_constraint_policy,
        "Starting finwatch"
    );

    let pool = config
        .database
        .pool_options()
        .connect(&config.database.url)
        .await
        .context("Failed to connect to PostgreSQL")?;

    if config.database.run_migrations {
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("Failed to run migrations")?;
        info!("Database migrations applied");
    }

    let analyses: Arc<dyn AnalysisRepository> =
        Arc::new(PostgresAnalysisRepository::new(pool.clone()));
    let documents: Arc<dyn DocumentRepository> =
        Arc::new(PostgresDocumentRepository::new(pool.clone()));
    let metrics: Arc<dyn MetricStore> = Arc::new(PostgresMetricStore::new(pool.clone()));

    let extractor = build_extractor(&config.extraction)?;

    let mut orchestrator = AnalysisOrchestrator::new(
        Arc::clone(&analyses),
        Arc::clone(&documents),
        Arc::clone(&metrics),
        Arc::new(PostgresConstraintReader::new(pool.clone())),
        Arc::new(PostgresAlertRepository::new(pool.clone())),
        config.pipeline.orchestrator(),
    );
    if let Some(http) = config.enrichment.http_config() {
        let provider =
            HttpEnrichmentProvider::new(http).context("Failed to build enrichment client")?;
        orchestrator = orchestrator.with_enrichment(Arc::new(provider));
    }

    let workers = Arc::new(AnalysisWorkerPool::start(
        Arc::new(orchestrator),
        config.pipeline.worker_pool(),
    ));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let intake_task = match config.pipeline.intake(&config.extraction) {
        Some(intake_config) => {
            info!(
                extractor = extractor.name(),
                upload_dir = %intake_config.upload_dir.display(),
                poll_interval_secs = intake_config.poll_interval.as_secs(),
                "Pipeline intake enabled"
            );
            let extraction = ExtractDocumentHandler::new(
                Arc::clone(&documents),
                Arc::clone(&metrics),
                extractor,
            );
            let intake = PipelineIntake::new(
                Arc::clone(&analyses),
                Arc::clone(&documents),
                workers.clone(),
                intake_config,
            )
            .with_extraction(extraction);
            Some(tokio::spawn(async move { intake.run(shutdown_rx).await }))
        }
        None => {
            warn!("Pipeline intake disabled, no work will be picked up from storage");
            None
        }
    };

    info!(enrichment = config.enrichment.enabled, "Finwatch ready");

    shutdown_signal().await;

    let _ = shutdown_tx.send(true);
    if let Some(task) = intake_task {
        if let Err(e) = task.await {
            warn!(error = %e, "Pipeline intake task ended abnormally");
        }
    }

    if !workers.shutdown(config.pipeline.shutdown_grace()).await {
        warn!("Some analyses were aborted during shutdown");
    }
    pool.close().await;

    info!("Finwatch stopped");
    Ok(())
}

fn init_tracing(runtime: &RuntimeConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&runtime.log_level));
    let registry = tracing_subscriber::registry().with(filter);

    if runtime.json_logs {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

fn build_extractor(config: &ExtractionConfig) -> anyhow::Result<Arc<dyn ExtractionService>> {
    match config.service_url() {
        Some(url) => {
            let service = HttpExtractionService::new(url, config.timeout())
                .context("Failed to build extraction client")?;
            Ok(Arc::new(service))
        }
        None => Ok(Arc::new(PatternMetricExtractor::new())),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received terminate signal, shutting down"),
    }
}
