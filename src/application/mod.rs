//! Application layer - Commands, Queries, Handlers and the analysis pipeline.
//!
//! Handlers validate a request, touch the repositories and hand work to the
//! pipeline. The pipeline runs analyses in the background and owns their
//! terminal transition.

pub mod handlers;
pub mod pipeline;

pub use handlers::analysis::{
    AnalysisView, GetAnalysisHandler, ListAnalysesHandler, RerunAnalysisCommand,
    RerunAnalysisHandler, StartAnalysisCommand, StartAnalysisHandler,
};
pub use handlers::document::{
    ExtractDocumentCommand, ExtractDocumentError, ExtractDocumentHandler, ExtractDocumentResult,
};
pub use pipeline::{
    AnalysisOrchestrator, AnalysisRunner, AnalysisWorkerPool, IntakeConfig, IntakeReport,
    OrchestratorConfig, PipelineIntake, WorkerPoolConfig,
};
