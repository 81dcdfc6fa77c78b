//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Persistence Ports
//!
//! - `DocumentRepository` - uploaded filings
//! - `MetricStore` - extraction snapshots per document
//! - `ConstraintReader` - read access to user-defined rules
//! - `AnalysisRepository` - analysis lifecycle rows with write-once finalize
//! - `AlertRepository` - alerts produced by each analysis
//!
//! ## Collaborator Ports
//!
//! - `ExtractionService` - turns a stored file into metrics
//! - `EnrichmentProvider` - optional, time-bounded metric augmentation
//! - `AnalysisQueue` - non-blocking hand-off to background workers

mod alert_repository;
mod analysis_queue;
mod analysis_repository;
mod constraint_reader;
mod document_repository;
mod enrichment_provider;
mod extraction_service;
mod metric_store;

pub use alert_repository::AlertRepository;
pub use analysis_queue::{AnalysisJob, AnalysisQueue};
pub use analysis_repository::AnalysisRepository;
pub use constraint_reader::ConstraintReader;
pub use document_repository::DocumentRepository;
pub use enrichment_provider::{
    EnrichmentError, EnrichmentProvider, EnrichmentRequest, EnrichmentResult,
};
pub use extraction_service::{
    ExtractionError, ExtractionOutput, ExtractionRequest, ExtractionService,
};
pub use metric_store::MetricStore;
