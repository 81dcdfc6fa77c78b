//! PostgreSQL implementation of AlertRepository.
//!
//! An analysis's alerts are inserted in one transaction; `position` keeps
//! the order the mapper produced them in.

use async_trait::async_trait;
use sqlx::PgPool;

use super::{column, db_error};
use crate::domain::alert::Alert;
use crate::domain::constraint::Severity;
use crate::domain::foundation::{AlertId, AnalysisId, ConstraintId, DomainError, Timestamp};
use crate::ports::AlertRepository;

/// PostgreSQL implementation of AlertRepository.
#[derive(Clone)]
pub struct PostgresAlertRepository {
    pool: PgPool,
}

impl PostgresAlertRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AlertRepository for PostgresAlertRepository {
    async fn save_alerts(
        &self,
        analysis_id: &AnalysisId,
        alerts: &[Alert],
    ) -> Result<(), DomainError> {
        if alerts.is_empty() {
            return Ok(());
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| db_error("begin alert transaction", e))?;

        for (position, alert) in alerts.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO alerts (
                    id, analysis_id, constraint_id, metric_name, severity, message,
                    actual_value, expected_value, acknowledged, created_at, position
                ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
                "#,
            )
            .bind(alert.id.as_uuid())
            .bind(analysis_id.as_uuid())
            .bind(alert.constraint_id.as_uuid())
            .bind(&alert.metric_name)
            .bind(alert.severity.as_str())
            .bind(&alert.message)
            .bind(alert.actual_value)
            .bind(alert.expected_value)
            .bind(alert.acknowledged)
            .bind(alert.created_at.as_datetime())
            .bind(position as i32)
            .execute(&mut *tx)
            .await
            .map_err(|e| db_error("insert alert", e))?;
        }

        tx.commit()
            .await
            .map_err(|e| db_error("commit alerts", e))?;

        Ok(())
    }

    async fn find_by_analysis(&self, analysis_id: &AnalysisId) -> Result<Vec<Alert>, DomainError> {
        let rows = sqlx::query(
            r#"
            SELECT id, analysis_id, constraint_id, metric_name, severity, message,
                   actual_value, expected_value, acknowledged, created_at
            FROM alerts
            WHERE analysis_id = $1
            ORDER BY position
            "#,
        )
        .bind(analysis_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("fetch alerts", e))?;

        rows.iter().map(row_to_alert).collect()
    }

    async fn count_by_analysis(&self, analysis_id: &AnalysisId) -> Result<u64, DomainError> {
        let result: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM alerts WHERE analysis_id = $1")
            .bind(analysis_id.as_uuid())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| db_error("count alerts", e))?;

        Ok(result.0 as u64)
    }
}

fn row_to_alert(row: &sqlx::postgres::PgRow) -> Result<Alert, DomainError> {
    let id: uuid::Uuid = column(row, "id")?;
    let analysis_id: uuid::Uuid = column(row, "analysis_id")?;
    let constraint_id: uuid::Uuid = column(row, "constraint_id")?;
    let severity: String = column(row, "severity")?;
    let created_at: chrono::DateTime<chrono::Utc> = column(row, "created_at")?;

    Ok(Alert {
        id: AlertId::from_uuid(id),
        analysis_id: AnalysisId::from_uuid(analysis_id),
        constraint_id: ConstraintId::from_uuid(constraint_id),
        metric_name: column(row, "metric_name")?,
        severity: severity
            .parse::<Severity>()
            .map_err(|e| db_error("read severity", e))?,
        message: column(row, "message")?,
        actual_value: column(row, "actual_value")?,
        expected_value: column(row, "expected_value")?,
        acknowledged: column(row, "acknowledged")?,
        created_at: Timestamp::from_datetime(created_at),
    })
}
