//! PostgreSQL implementation of MetricStore.
//!
//! Each extraction is one row; the metric list is stored as JSONB so a
//! snapshot is read back exactly as it was written.

use async_trait::async_trait;
use sqlx::PgPool;

use super::{column, db_error};
use crate::domain::foundation::{DocumentId, DomainError, SnapshotId, Timestamp};
use crate::domain::metric::{Metric, MetricSnapshot};
use crate::ports::MetricStore;

/// PostgreSQL implementation of MetricStore.
#[derive(Clone)]
pub struct PostgresMetricStore {
    pool: PgPool,
}

impl PostgresMetricStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MetricStore for PostgresMetricStore {
    async fn latest_snapshot(
        &self,
        document_id: &DocumentId,
    ) -> Result<Option<MetricSnapshot>, DomainError> {
        // seq breaks ties between snapshots written in the same instant
        let row = sqlx::query(
            r#"
            SELECT id, document_id, metrics, confidence, extracted_at
            FROM metric_snapshots
            WHERE document_id = $1
            ORDER BY seq DESC
            LIMIT 1
            "#,
        )
        .bind(document_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("fetch metric snapshot", e))?;

        row.map(|row| row_to_snapshot(&row)).transpose()
    }

    async fn record_snapshot(&self, snapshot: &MetricSnapshot) -> Result<(), DomainError> {
        let metrics = serde_json::to_value(&snapshot.metrics)
            .map_err(|e| db_error("encode metrics", e))?;

        sqlx::query(
            r#"
            INSERT INTO metric_snapshots (id, document_id, metrics, confidence, extracted_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(snapshot.id.as_uuid())
        .bind(snapshot.document_id.as_uuid())
        .bind(metrics)
        .bind(snapshot.confidence)
        .bind(snapshot.extracted_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("insert metric snapshot", e))?;

        Ok(())
    }
}

fn row_to_snapshot(row: &sqlx::postgres::PgRow) -> Result<MetricSnapshot, DomainError> {
    let id: uuid::Uuid = column(row, "id")?;
    let document_id: uuid::Uuid = column(row, "document_id")?;
    let metrics: serde_json::Value = column(row, "metrics")?;
    let confidence: f64 = column(row, "confidence")?;
    let extracted_at: chrono::DateTime<chrono::Utc> = column(row, "extracted_at")?;

    Ok(MetricSnapshot {
        id: SnapshotId::from_uuid(id),
        document_id: DocumentId::from_uuid(document_id),
        metrics: decode_metrics(metrics)?,
        confidence,
        extracted_at: Timestamp::from_datetime(extracted_at),
    })
}

fn decode_metrics(value: serde_json::Value) -> Result<Vec<Metric>, DomainError> {
    serde_json::from_value(value).map_err(|e| db_error("decode metrics", e))
}
