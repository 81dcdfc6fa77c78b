//! Analysis pipeline - the orchestrator, the worker pool that runs it and
//! the intake that feeds it from storage.

mod intake;
mod orchestrator;
mod worker_pool;

pub use intake::{IntakeConfig, IntakeReport, PipelineIntake};
pub use orchestrator::{AnalysisOrchestrator, AnalysisRunner, OrchestratorConfig};
pub use worker_pool::{AnalysisWorkerPool, WorkerPoolConfig};
