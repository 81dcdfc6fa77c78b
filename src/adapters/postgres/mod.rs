//! PostgreSQL adapters - Database implementations for repository ports.
//!
//! This module provides adapters for PostgreSQL-backed persistence:
//! - `PostgresDocumentRepository` - document metadata and status
//! - `PostgresMetricStore` - append-only metric snapshots (JSONB)
//! - `PostgresConstraintReader` - read side of the constraint table
//! - `PostgresAnalysisRepository` - analysis rows with write-once finalization
//! - `PostgresAlertRepository` - per-analysis alert batches

mod alert_repository;
mod analysis_repository;
mod constraint_reader;
mod document_repository;
mod metric_store;

pub use alert_repository::PostgresAlertRepository;
pub use analysis_repository::PostgresAnalysisRepository;
pub use constraint_reader::PostgresConstraintReader;
pub use document_repository::PostgresDocumentRepository;
pub use metric_store::PostgresMetricStore;

use crate::domain::foundation::{DomainError, ErrorCode};

fn db_error(action: &str, err: impl std::fmt::Display) -> DomainError {
    DomainError::new(ErrorCode::DatabaseError, format!("Failed to {}: {}", action, err))
}

fn column<'r, T>(row: &'r sqlx::postgres::PgRow, name: &str) -> Result<T, DomainError>
where
    T: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
{
    use sqlx::Row;
    row.try_get(name)
        .map_err(|e| db_error(&format!("get {}", name), e))
}
