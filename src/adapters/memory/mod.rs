//! In-memory adapters.
//!
//! Each store keeps its state behind a `tokio::sync::RwLock` and is cheap to
//! clone (shared `Arc`). They honour the same contracts as the PostgreSQL
//! adapters, including write-once analysis finalization, and back the test
//! suite and local runs without a database.

mod alert_repository;
mod analysis_repository;
mod constraint_store;
mod document_repository;
mod metric_store;

pub use alert_repository::InMemoryAlertRepository;
pub use analysis_repository::InMemoryAnalysisRepository;
pub use constraint_store::InMemoryConstraintStore;
pub use document_repository::InMemoryDocumentRepository;
pub use metric_store::InMemoryMetricStore;
