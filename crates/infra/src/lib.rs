//! `gatewise-infra` — infrastructure adapters behind the domain seams.
//!
//! Process-wide cache gateway, typed store traits with in-memory
//! implementations, the cache-backed tenant resolver, and the role-grant
//! reconciliation service.

pub mod cache;
pub mod resolver;
pub mod store;
pub mod sync;

pub use cache::{CacheError, CacheGateway, query_key};
pub use resolver::{TENANT_CACHE_TAG, TenantResolver};
pub use store::{
    InMemoryModuleStore, InMemoryRolePermissionStore, InMemoryTenantStore, ModuleStore,
    RolePermissionStore, StoreError, TenantStore,
};
pub use sync::{RolePermissionSync, SyncOutcome};
