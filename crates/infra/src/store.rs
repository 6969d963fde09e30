//! Typed store seams for the tenancy/authorization entities.
//!
//! Persistence technology lives outside this crate; these traits are the
//! boundary, and the in-memory implementations back tests, dev runs, and the
//! examples in the API wiring.

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use thiserror::Error;

use gatewise_core::{Module, Permission, PermissionId, RoleId, Tenant, TenantId};

#[derive(Debug, Error)]
pub enum StoreError {
    /// The role's grant set changed between diff computation and commit.
    /// Retryable.
    #[error("grants for role {0} were modified concurrently; retry the sync")]
    Conflict(RoleId),

    /// Backing store failure (connectivity, corruption, …).
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

#[async_trait]
pub trait TenantStore: Send + Sync {
    /// Full tenant record by id, soft-deleted rows included.
    async fn find(&self, id: TenantId) -> Result<Option<Tenant>, StoreError>;
}

#[async_trait]
pub trait ModuleStore: Send + Sync {
    async fn modules(&self) -> Result<Vec<Module>, StoreError>;
    async fn permissions(&self) -> Result<Vec<Permission>, StoreError>;
}

#[async_trait]
pub trait RolePermissionStore: Send + Sync {
    /// Permission ids currently granted to `role`.
    async fn granted(&self, role: RoleId) -> Result<HashSet<PermissionId>, StoreError>;

    /// Apply a computed diff as one atomic unit.
    ///
    /// Fails with [`StoreError::Conflict`] when the persisted set no longer
    /// equals `expected` — the caller's diff is stale and must be recomputed.
    /// Readers never observe a partially applied diff.
    async fn reconcile(
        &self,
        role: RoleId,
        expected: &HashSet<PermissionId>,
        remove: &[PermissionId],
        insert: &[PermissionId],
    ) -> Result<(), StoreError>;
}

fn poisoned() -> StoreError {
    StoreError::Backend(anyhow::anyhow!("store lock poisoned"))
}

/// In-memory tenant store for tests/dev.
///
/// Counts lookups so tests can assert that bypassed or cached paths never
/// reach the store.
#[derive(Debug, Default)]
pub struct InMemoryTenantStore {
    inner: RwLock<HashMap<TenantId, Tenant>>,
    lookups: AtomicUsize,
}

impl InMemoryTenantStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert(&self, tenant: Tenant) {
        if let Ok(mut map) = self.inner.write() {
            map.insert(tenant.id, tenant);
        }
    }

    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TenantStore for InMemoryTenantStore {
    async fn find(&self, id: TenantId) -> Result<Option<Tenant>, StoreError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        let map = self.inner.read().map_err(|_| poisoned())?;
        Ok(map.get(&id).cloned())
    }
}

/// In-memory module/permission store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryModuleStore {
    modules: RwLock<Vec<Module>>,
    permissions: RwLock<Vec<Permission>>,
}

impl InMemoryModuleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, modules: Vec<Module>, permissions: Vec<Permission>) {
        if let Ok(mut rows) = self.modules.write() {
            *rows = modules;
        }
        if let Ok(mut rows) = self.permissions.write() {
            *rows = permissions;
        }
    }
}

#[async_trait]
impl ModuleStore for InMemoryModuleStore {
    async fn modules(&self) -> Result<Vec<Module>, StoreError> {
        Ok(self.modules.read().map_err(|_| poisoned())?.clone())
    }

    async fn permissions(&self) -> Result<Vec<Permission>, StoreError> {
        Ok(self.permissions.read().map_err(|_| poisoned())?.clone())
    }
}

/// In-memory role-grant store for tests/dev.
///
/// `reconcile` runs under one write lock, the single-transaction analogue:
/// a concurrent `granted` reader sees either the old or the new set.
#[derive(Debug, Default)]
pub struct InMemoryRolePermissionStore {
    grants: RwLock<HashMap<RoleId, HashSet<PermissionId>>>,
}

impl InMemoryRolePermissionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, role: RoleId, permissions: &[PermissionId]) {
        if let Ok(mut map) = self.grants.write() {
            map.insert(role, permissions.iter().copied().collect());
        }
    }
}

#[async_trait]
impl RolePermissionStore for InMemoryRolePermissionStore {
    async fn granted(&self, role: RoleId) -> Result<HashSet<PermissionId>, StoreError> {
        let map = self.grants.read().map_err(|_| poisoned())?;
        Ok(map.get(&role).cloned().unwrap_or_default())
    }

    async fn reconcile(
        &self,
        role: RoleId,
        expected: &HashSet<PermissionId>,
        remove: &[PermissionId],
        insert: &[PermissionId],
    ) -> Result<(), StoreError> {
        let mut map = self.grants.write().map_err(|_| poisoned())?;
        let current = map.entry(role).or_default();
        if current != expected {
            return Err(StoreError::Conflict(role));
        }
        for id in remove {
            current.remove(id);
        }
        for id in insert {
            current.insert(*id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reconcile_rejects_a_stale_expected_set() {
        let store = InMemoryRolePermissionStore::new();
        let role = RoleId::new(1);
        store.seed(role, &[PermissionId::new(1)]);

        let stale: HashSet<PermissionId> = HashSet::new();
        let err = store
            .reconcile(role, &stale, &[], &[PermissionId::new(2)])
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(r) if r == role));

        // The failed attempt changed nothing.
        let granted = store.granted(role).await.unwrap();
        assert_eq!(granted, [PermissionId::new(1)].into_iter().collect());
    }

    #[tokio::test]
    async fn tenant_store_counts_lookups() {
        let store = InMemoryTenantStore::new();
        assert_eq!(store.lookup_count(), 0);
        let _ = store.find(TenantId::new(1)).await.unwrap();
        assert_eq!(store.lookup_count(), 1);
    }
}
