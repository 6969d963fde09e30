//! Role-grant reconciliation.
//!
//! Brings a role's persisted permission set to a desired target set by
//! computing the symmetric difference and applying only that diff. Grants in
//! both sets are never touched — no delete-and-reinsert churn — and the
//! apply is atomic at the store, so a concurrent permission check reads
//! either the old set or the new one, never a mixture.

use std::collections::HashSet;
use std::sync::Arc;

use gatewise_core::{PermissionId, RoleId};

use crate::store::{RolePermissionStore, StoreError};

/// What a sync actually changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct SyncOutcome {
    pub added: usize,
    pub removed: usize,
    pub kept: usize,
}

pub struct RolePermissionSync {
    grants: Arc<dyn RolePermissionStore>,
}

impl RolePermissionSync {
    pub fn new(grants: Arc<dyn RolePermissionStore>) -> Self {
        Self { grants }
    }

    /// Reconcile `role`'s grants to exactly `desired`.
    ///
    /// Fails with [`StoreError::Conflict`] when the persisted set changed
    /// between diff computation and commit; callers should retry.
    pub async fn sync(
        &self,
        role: RoleId,
        desired: &[PermissionId],
    ) -> Result<SyncOutcome, StoreError> {
        let current = self.grants.granted(role).await?;
        let desired: HashSet<PermissionId> = desired.iter().copied().collect();

        let remove: Vec<PermissionId> = current.difference(&desired).copied().collect();
        let insert: Vec<PermissionId> = desired.difference(&current).copied().collect();
        let kept = current.len() - remove.len();

        if remove.is_empty() && insert.is_empty() {
            return Ok(SyncOutcome {
                added: 0,
                removed: 0,
                kept,
            });
        }

        self.grants.reconcile(role, &current, &remove, &insert).await?;

        tracing::debug!(
            role = %role,
            added = insert.len(),
            removed = remove.len(),
            kept,
            "role grants reconciled"
        );

        Ok(SyncOutcome {
            added: insert.len(),
            removed: remove.len(),
            kept,
        })
    }
}
