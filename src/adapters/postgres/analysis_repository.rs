//! PostgreSQL implementation of AnalysisRepository.
//!
//! Finalization is a conditional UPDATE guarded by `status = 'running'`,
//! so two writers racing to finalize the same row cannot both succeed.

use async_trait::async_trait;
use sqlx::PgPool;

use super::{column, db_error};
use crate::domain::analysis::{Analysis, AnalysisStatus};
use crate::domain::foundation::{
    AnalysisId, ConstraintId, DocumentId, DomainError, ErrorCode, Timestamp,
};
use crate::ports::AnalysisRepository;

const SELECT_COLUMNS: &str = r#"
    SELECT id, document_id, constraint_ids, enrich_requested, status,
           started_at, completed_at, error_message, enrichment, rerun_of
    FROM analyses
"#;

/// PostgreSQL implementation of AnalysisRepository.
#[derive(Clone)]
pub struct PostgresAnalysisRepository {
    pool: PgPool,
}

impl PostgresAnalysisRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn exists(&self, id: &AnalysisId) -> Result<bool, DomainError> {
        let result: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM analyses WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| db_error("check analysis existence", e))?;

        Ok(result.0 > 0)
    }
}

#[async_trait]
impl AnalysisRepository for PostgresAnalysisRepository {
    async fn create(&self, analysis: &Analysis) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO analyses (
                id, document_id, constraint_ids, enrich_requested, status,
                started_at, completed_at, error_message, enrichment, rerun_of
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(analysis.id().as_uuid())
        .bind(analysis.document_id().as_uuid())
        .bind(constraint_uuids(analysis.constraint_ids()))
        .bind(analysis.enrich_requested())
        .bind(analysis.status().as_str())
        .bind(analysis.started_at().as_datetime())
        .bind(analysis.completed_at().map(|t| *t.as_datetime()))
        .bind(analysis.error_message())
        .bind(analysis.enrichment())
        .bind(analysis.rerun_of().map(|id| *id.as_uuid()))
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("insert analysis", e))?;

        Ok(())
    }

    async fn find_by_id(&self, id: &AnalysisId) -> Result<Option<Analysis>, DomainError> {
        let row = sqlx::query(&format!("{} WHERE id = $1", SELECT_COLUMNS))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("fetch analysis", e))?;

        row.map(|row| row_to_analysis(&row)).transpose()
    }

    async fn finalize(&self, analysis: &Analysis) -> Result<(), DomainError> {
        if !analysis.is_finalized() {
            return Err(DomainError::new(
                ErrorCode::InvalidStateTransition,
                format!("Analysis {} is still running", analysis.id()),
            ));
        }

        let result = sqlx::query(
            r#"
            UPDATE analyses SET
                status = $2,
                completed_at = $3,
                error_message = $4,
                enrichment = $5
            WHERE id = $1 AND status = 'running'
            "#,
        )
        .bind(analysis.id().as_uuid())
        .bind(analysis.status().as_str())
        .bind(analysis.completed_at().map(|t| *t.as_datetime()))
        .bind(analysis.error_message())
        .bind(analysis.enrichment())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("finalize analysis", e))?;

        if result.rows_affected() == 0 {
            return Err(if self.exists(analysis.id()).await? {
                DomainError::new(
                    ErrorCode::AnalysisAlreadyFinalized,
                    format!("Analysis {} is already finalized", analysis.id()),
                )
            } else {
                DomainError::new(
                    ErrorCode::AnalysisNotFound,
                    format!("Analysis not found: {}", analysis.id()),
                )
            });
        }

        Ok(())
    }

    async fn list_by_document(
        &self,
        document_id: &DocumentId,
    ) -> Result<Vec<Analysis>, DomainError> {
        let rows = sqlx::query(&format!(
            "{} WHERE document_id = $1 ORDER BY started_at DESC, id DESC",
            SELECT_COLUMNS
        ))
        .bind(document_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("fetch analyses by document", e))?;

        rows.iter().map(row_to_analysis).collect()
    }

    async fn list_running(&self, limit: u32) -> Result<Vec<Analysis>, DomainError> {
        let rows = sqlx::query(&format!(
            "{} WHERE status = 'running' ORDER BY started_at ASC, id ASC LIMIT $1",
            SELECT_COLUMNS
        ))
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("fetch running analyses", e))?;

        rows.iter().map(row_to_analysis).collect()
    }
}

fn constraint_uuids(ids: &[ConstraintId]) -> Vec<uuid::Uuid> {
    ids.iter().map(|id| *id.as_uuid()).collect()
}

fn row_to_analysis(row: &sqlx::postgres::PgRow) -> Result<Analysis, DomainError> {
    let id: uuid::Uuid = column(row, "id")?;
    let document_id: uuid::Uuid = column(row, "document_id")?;
    let constraint_ids: Vec<uuid::Uuid> = column(row, "constraint_ids")?;
    let enrich_requested: bool = column(row, "enrich_requested")?;
    let status: String = column(row, "status")?;
    let started_at: chrono::DateTime<chrono::Utc> = column(row, "started_at")?;
    let completed_at: Option<chrono::DateTime<chrono::Utc>> = column(row, "completed_at")?;
    let error_message: Option<String> = column(row, "error_message")?;
    let enrichment: Option<serde_json::Value> = column(row, "enrichment")?;
    let rerun_of: Option<uuid::Uuid> = column(row, "rerun_of")?;

    Ok(Analysis::reconstitute(
        AnalysisId::from_uuid(id),
        DocumentId::from_uuid(document_id),
        constraint_ids.into_iter().map(ConstraintId::from_uuid).collect(),
        enrich_requested,
        status
            .parse::<AnalysisStatus>()
            .map_err(|e| db_error("read status", e))?,
        Timestamp::from_datetime(started_at),
        completed_at.map(Timestamp::from_datetime),
        error_message,
        enrichment,
        rerun_of.map(AnalysisId::from_uuid),
    ))
}
