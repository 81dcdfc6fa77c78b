//! PipelineIntake - picks up work written to storage by other processes.
//!
//! Documents and analyses are created by an external upload/CRUD layer.
//! The intake polls storage on a fixed interval and feeds the pipeline:
//! 1. Documents still `uploaded` are extracted, one at a time
//! 2. Analyses still `running` are submitted to the analysis queue
//!
//! Step 2 also recovers analyses left RUNNING by a previous process. The
//! queue ignores analyses it already holds, so re-reading the same rows on
//! every tick never starts a second run. A full queue defers the remaining
//! rows to the next tick instead of failing them.
//!
//! ## Configuration
//!
//! | Setting | Default | Description |
//! |---------|---------|-------------|
//! | `poll_interval` | 5s | How often storage is polled |
//! | `batch_size` | 32 | Max rows read per step per tick |
//! | `upload_dir` | `./uploads` | Root of stored files, laid out as `<upload_dir>/<document id>/<filename>` |

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time;
use tracing::{debug, info, warn};

use crate::application::handlers::document::{ExtractDocumentCommand, ExtractDocumentHandler};
use crate::domain::document::{Document, DocumentStatus};
use crate::domain::foundation::{DomainError, ErrorCode};
use crate::ports::{AnalysisJob, AnalysisQueue, AnalysisRepository, DocumentRepository};

/// Intake settings.
#[derive(Debug, Clone)]
pub struct IntakeConfig {
    pub poll_interval: Duration,
    pub batch_size: u32,
    pub upload_dir: PathBuf,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            batch_size: 32,
            upload_dir: PathBuf::from("./uploads"),
        }
    }
}

/// What one poll cycle did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IntakeReport {
    pub extracted: usize,
    pub extraction_failed: usize,
    pub submitted: usize,
    pub deferred: usize,
}

/// Background service feeding stored work into the pipeline.
pub struct PipelineIntake {
    analyses: Arc<dyn AnalysisRepository>,
    documents: Arc<dyn DocumentRepository>,
    queue: Arc<dyn AnalysisQueue>,
    extraction: Option<ExtractDocumentHandler>,
    config: IntakeConfig,
}

impl PipelineIntake {
    pub fn new(
        analyses: Arc<dyn AnalysisRepository>,
        documents: Arc<dyn DocumentRepository>,
        queue: Arc<dyn AnalysisQueue>,
        config: IntakeConfig,
    ) -> Self {
        Self {
            analyses,
            documents,
            queue,
            extraction: None,
            config,
        }
    }

    /// Also extract uploaded documents on every tick.
    pub fn with_extraction(mut self, handler: ExtractDocumentHandler) -> Self {
        self.extraction = Some(handler);
        self
    }

    /// Poll until `shutdown` flips to `true`.
    ///
    /// Poll errors are logged and retried on the next tick.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut interval = time::interval(self.config.poll_interval);
        interval.set_missed_tick_behavior(time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        debug!("Pipeline intake stopped");
                        return;
                    }
                }
                _ = interval.tick() => {
                    match self.poll_once().await {
                        Ok(report) if report != IntakeReport::default() => {
                            info!(?report, "Pipeline intake cycle");
                        }
                        Ok(_) => {}
                        Err(err) => warn!(error = %err, "Pipeline intake cycle failed"),
                    }
                }
            }
        }
    }

    /// Run one poll cycle: extraction first, so documents processed now
    /// are ready for analyses claimed in the same cycle.
    pub async fn poll_once(&self) -> Result<IntakeReport, DomainError> {
        let mut report = IntakeReport::default();
        self.extract_uploaded(&mut report).await?;
        self.claim_running(&mut report).await?;
        Ok(report)
    }

    /// Where the file of `document` is stored.
    pub fn document_path(&self, document: &Document) -> PathBuf {
        stored_file(&self.config.upload_dir, document)
    }

    async fn extract_uploaded(&self, report: &mut IntakeReport) -> Result<(), DomainError> {
        let Some(handler) = self.extraction.as_ref() else {
            return Ok(());
        };

        let uploaded = self
            .documents
            .list_by_status(DocumentStatus::Uploaded, self.config.batch_size)
            .await?;

        for document in uploaded {
            let command = ExtractDocumentCommand {
                document_id: *document.id(),
                file_path: self.document_path(&document),
                file_type: document.file_type(),
            };
            match handler.handle(command).await {
                Ok(_) => report.extracted += 1,
                Err(err) => {
                    warn!(
                        document_id = %document.id(),
                        code = %err.code(),
                        error = %err,
                        "Uploaded document could not be extracted"
                    );
                    report.extraction_failed += 1;
                }
            }
        }
        Ok(())
    }

    async fn claim_running(&self, report: &mut IntakeReport) -> Result<(), DomainError> {
        let running = self.analyses.list_running(self.config.batch_size).await?;

        for (index, analysis) in running.iter().enumerate() {
            match self.queue.submit(AnalysisJob::new(*analysis.id())) {
                Ok(()) => report.submitted += 1,
                Err(err) if err.code == ErrorCode::QueueFull => {
                    report.deferred += running.len() - index;
                    debug!(deferred = report.deferred, "Analysis queue full, deferring");
                    break;
                }
                Err(err) if err.code == ErrorCode::Cancelled => break,
                Err(err) => return Err(err),
            }
        }
        Ok(())
    }
}

fn stored_file(upload_dir: &Path, document: &Document) -> PathBuf {
    upload_dir
        .join(document.id().to_string())
        .join(document.filename())
}
