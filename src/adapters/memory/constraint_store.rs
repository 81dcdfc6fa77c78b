//! In-memory constraint store.
//!
//! Stands in for the CRUD layer that owns constraints. Implements the read
//! port used by the pipeline plus a few write helpers for setup.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::constraint::Constraint;
use crate::domain::foundation::{ConstraintId, DomainError, UserId};
use crate::ports::ConstraintReader;

/// Constraints keyed by id, with insertion order kept for owner listings.
#[derive(Debug, Clone, Default)]
pub struct InMemoryConstraintStore {
    inner: Arc<RwLock<Inner>>,
}

#[derive(Debug, Default)]
struct Inner {
    by_id: HashMap<ConstraintId, Constraint>,
    order: Vec<ConstraintId>,
}

impl InMemoryConstraintStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a constraint.
    pub async fn upsert(&self, constraint: Constraint) {
        let mut inner = self.inner.write().await;
        let id = *constraint.id();
        if inner.by_id.insert(id, constraint).is_none() {
            inner.order.push(id);
        }
    }

    /// Delete a constraint. Returns whether it existed.
    pub async fn delete(&self, id: &ConstraintId) -> bool {
        let mut inner = self.inner.write().await;
        inner.order.retain(|existing| existing != id);
        inner.by_id.remove(id).is_some()
    }
}

#[async_trait]
impl ConstraintReader for InMemoryConstraintStore {
    async fn find_by_ids(&self, ids: &[ConstraintId]) -> Result<Vec<Constraint>, DomainError> {
        let inner = self.inner.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| inner.by_id.get(id).cloned())
            .collect())
    }

    async fn active_ids_for_owner(
        &self,
        owner_id: &UserId,
    ) -> Result<Vec<ConstraintId>, DomainError> {
        let inner = self.inner.read().await;
        Ok(inner
            .order
            .iter()
            .filter_map(|id| inner.by_id.get(id))
            .filter(|c| c.owner_id() == owner_id && c.is_active())
            .map(|c| *c.id())
            .collect())
    }
}
