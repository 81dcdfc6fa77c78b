//! ConstraintReader port (read side).
//!
//! Constraints are written by the CRUD layer. The pipeline only resolves
//! them by id when a run starts evaluating.

use async_trait::async_trait;

use crate::domain::constraint::Constraint;
use crate::domain::foundation::{ConstraintId, DomainError, UserId};

/// Read-only access to threshold rules.
#[async_trait]
pub trait ConstraintReader: Send + Sync {
    /// Resolve constraints by id, in the order given.
    ///
    /// Ids that no longer exist are skipped. Inactive constraints are
    /// returned; the evaluator skips them.
    async fn find_by_ids(&self, ids: &[ConstraintId]) -> Result<Vec<Constraint>, DomainError>;

    /// Ids of the owner's currently active constraints.
    ///
    /// Used when a rerun re-resolves its constraint set.
    async fn active_ids_for_owner(&self, owner_id: &UserId)
        -> Result<Vec<ConstraintId>, DomainError>;
}
