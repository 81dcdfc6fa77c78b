//! PostgreSQL implementation of ConstraintReader.
//!
//! Constraints are owned by a separate CRUD surface; the pipeline only
//! reads them.

use async_trait::async_trait;
use sqlx::PgPool;
use std::collections::HashMap;

use super::{column, db_error};
use crate::domain::constraint::{Constraint, Operator, Severity};
use crate::domain::foundation::{ConstraintId, DomainError, UserId};
use crate::ports::ConstraintReader;

/// PostgreSQL implementation of ConstraintReader.
#[derive(Clone)]
pub struct PostgresConstraintReader {
    pool: PgPool,
}

impl PostgresConstraintReader {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ConstraintReader for PostgresConstraintReader {
    async fn find_by_ids(&self, ids: &[ConstraintId]) -> Result<Vec<Constraint>, DomainError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let uuids: Vec<uuid::Uuid> = ids.iter().map(|id| *id.as_uuid()).collect();
        let rows = sqlx::query(
            r#"
            SELECT id, owner_id, name, metric, operator, threshold, severity, message, active
            FROM constraints
            WHERE id = ANY($1)
            "#,
        )
        .bind(&uuids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("fetch constraints", e))?;

        let mut by_id = rows
            .iter()
            .map(|row| row_to_constraint(row).map(|c| (*c.id(), c)))
            .collect::<Result<HashMap<_, _>, _>>()?;

        Ok(in_request_order(ids, &mut by_id))
    }

    async fn active_ids_for_owner(
        &self,
        owner_id: &UserId,
    ) -> Result<Vec<ConstraintId>, DomainError> {
        let rows = sqlx::query(
            r#"
            SELECT id FROM constraints
            WHERE owner_id = $1 AND active
            ORDER BY created_at, id
            "#,
        )
        .bind(owner_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("fetch active constraint ids", e))?;

        rows.iter()
            .map(|row| column::<uuid::Uuid>(row, "id").map(ConstraintId::from_uuid))
            .collect()
    }
}

/// Orders fetched constraints like the request and drops unknown ids.
fn in_request_order(
    ids: &[ConstraintId],
    by_id: &mut HashMap<ConstraintId, Constraint>,
) -> Vec<Constraint> {
    ids.iter().filter_map(|id| by_id.remove(id)).collect()
}

fn row_to_constraint(row: &sqlx::postgres::PgRow) -> Result<Constraint, DomainError> {
    let id: uuid::Uuid = column(row, "id")?;
    let owner_id: String = column(row, "owner_id")?;
    let name: String = column(row, "name")?;
    let metric: String = column(row, "metric")?;
    let operator: String = column(row, "operator")?;
    let threshold: f64 = column(row, "threshold")?;
    let severity: String = column(row, "severity")?;
    let message: String = column(row, "message")?;
    let active: bool = column(row, "active")?;

    Ok(Constraint::reconstitute(
        ConstraintId::from_uuid(id),
        UserId::new(owner_id).map_err(|e| db_error("read owner_id", e))?,
        name,
        metric,
        operator
            .parse::<Operator>()
            .map_err(|e| db_error("read operator", e))?,
        threshold,
        severity
            .parse::<Severity>()
            .map_err(|e| db_error("read severity", e))?,
        message,
        active,
    ))
}
