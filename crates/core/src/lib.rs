//! `gatewise-core` — domain foundation for the tenancy/authorization core.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! typed identifiers, the domain error model, and the tenancy/authorization
//! entities with their deterministic invariants.

pub mod error;
pub mod id;
pub mod module;
pub mod tenant;

pub use error::{DomainError, DomainResult};
pub use id::{ModuleId, PermissionId, RoleId, TenantId};
pub use module::{Module, ModuleKind, Permission, RolePermission};
pub use tenant::Tenant;
