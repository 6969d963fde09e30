//! Module / Permission / RolePermission entities.
//!
//! Modules form a self-referencing hierarchy (`parent_id`); each module owns a
//! set of fine-grained permissions, and roles are linked to permissions via
//! the pure `RolePermission` association.

use serde::{Deserialize, Serialize};

use crate::id::{ModuleId, PermissionId, RoleId};

/// Kind of a node in the module hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModuleKind {
    /// Administrative area (top of the tree).
    Admin,
    /// Grouping node under a parent menu.
    SubMenu,
    /// Leaf feature gated by permissions.
    Feature,
}

impl core::fmt::Display for ModuleKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ModuleKind::Admin => write!(f, "Admin"),
            ModuleKind::SubMenu => write!(f, "SubMenu"),
            ModuleKind::Feature => write!(f, "Feature"),
        }
    }
}

/// A node of the authorization/menu hierarchy.
///
/// # Invariants
/// - The `parent_id` relation must be acyclic (validated when the tree is
///   assembled, not on every row mutation).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    pub id: ModuleId,
    pub name: String,
    /// Explicit ordering key for sibling display order.
    pub sort_order: i32,
    pub is_active: bool,
    pub kind: ModuleKind,
    pub parent_id: Option<ModuleId>,
}

/// A fine-grained permission owned by exactly one module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    pub id: PermissionId,
    pub name: String,
    pub description: String,
    pub module_id: ModuleId,
}

/// Pure role→permission association; the row's existence *is* the grant.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RolePermission {
    pub role_id: RoleId,
    pub permission_id: PermissionId,
}

impl RolePermission {
    pub fn new(role_id: RoleId, permission_id: PermissionId) -> Self {
        Self {
            role_id,
            permission_id,
        }
    }
}
