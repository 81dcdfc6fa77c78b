//! PostgreSQL implementation of DocumentRepository.

use async_trait::async_trait;
use sqlx::PgPool;

use super::{column, db_error};
use crate::domain::document::{Document, DocumentStatus, FileType};
use crate::domain::foundation::{DocumentId, DomainError, ErrorCode, Timestamp, UserId};
use crate::ports::DocumentRepository;

/// PostgreSQL implementation of DocumentRepository.
#[derive(Clone)]
pub struct PostgresDocumentRepository {
    pool: PgPool,
}

impl PostgresDocumentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DocumentRepository for PostgresDocumentRepository {
    async fn save(&self, document: &Document) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO documents (
                id, owner_id, filename, file_type, status, uploaded_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(document.id().as_uuid())
        .bind(document.owner_id().as_str())
        .bind(document.filename())
        .bind(document.file_type().as_str())
        .bind(document.status().as_str())
        .bind(document.uploaded_at().as_datetime())
        .bind(document.updated_at().as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("insert document", e))?;

        Ok(())
    }

    async fn update(&self, document: &Document) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE documents SET
                status = $2,
                updated_at = $3
            WHERE id = $1
            "#,
        )
        .bind(document.id().as_uuid())
        .bind(document.status().as_str())
        .bind(document.updated_at().as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("update document", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(
                ErrorCode::DocumentNotFound,
                format!("Document not found: {}", document.id()),
            ));
        }

        Ok(())
    }

    async fn find_by_id(&self, id: &DocumentId) -> Result<Option<Document>, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT id, owner_id, filename, file_type, status, uploaded_at, updated_at
            FROM documents
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("fetch document", e))?;

        row.map(|row| row_to_document(&row)).transpose()
    }

    async fn list_by_status(
        &self,
        status: DocumentStatus,
        limit: u32,
    ) -> Result<Vec<Document>, DomainError> {
        let rows = sqlx::query(
            r#"
            SELECT id, owner_id, filename, file_type, status, uploaded_at, updated_at
            FROM documents
            WHERE status = $1
            ORDER BY uploaded_at ASC, id ASC
            LIMIT $2
            "#,
        )
        .bind(status.as_str())
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("fetch documents by status", e))?;

        rows.iter().map(row_to_document).collect()
    }
}

fn row_to_document(row: &sqlx::postgres::PgRow) -> Result<Document, DomainError> {
    let id: uuid::Uuid = column(row, "id")?;
    let owner_id: String = column(row, "owner_id")?;
    let filename: String = column(row, "filename")?;
    let file_type: String = column(row, "file_type")?;
    let status: String = column(row, "status")?;
    let uploaded_at: chrono::DateTime<chrono::Utc> = column(row, "uploaded_at")?;
    let updated_at: chrono::DateTime<chrono::Utc> = column(row, "updated_at")?;

    Ok(Document::reconstitute(
        DocumentId::from_uuid(id),
        UserId::new(owner_id).map_err(|e| db_error("read owner_id", e))?,
        filename,
        file_type
            .parse::<FileType>()
            .map_err(|e| db_error("read file_type", e))?,
        status
            .parse::<DocumentStatus>()
            .map_err(|e| db_error("read status", e))?,
        Timestamp::from_datetime(uploaded_at),
        Timestamp::from_datetime(updated_at),
    ))
}
