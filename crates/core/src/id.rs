//! Strongly-typed identifiers used across the domain.
//!
//! Tenancy/authorization records carry small numeric keys; wrapping them in
//! newtypes keeps a `RoleId` from ever being passed where a `TenantId` is
//! expected.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Identifier of a tenant (multi-tenant isolation boundary).
///
/// `TenantId::NONE` (raw value 0) is the sentinel for "no tenant claim".
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(i32);

/// Identifier of an authorization module (menu/feature tree node).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleId(i32);

/// Identifier of a fine-grained permission owned by a module.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionId(i32);

/// Identifier of a role (RBAC grant subject).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleId(i32);

macro_rules! impl_numeric_id {
    ($t:ty, $name:literal) => {
        impl $t {
            pub const fn new(raw: i32) -> Self {
                Self(raw)
            }

            pub const fn raw(&self) -> i32 {
                self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<i32> for $t {
            fn from(value: i32) -> Self {
                Self(value)
            }
        }

        impl From<$t> for i32 {
            fn from(value: $t) -> Self {
                value.0
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let raw = i32::from_str(s.trim())
                    .map_err(|e| DomainError::invalid_id(format!("{}: {}", $name, e)))?;
                Ok(Self(raw))
            }
        }
    };
}

impl_numeric_id!(TenantId, "TenantId");
impl_numeric_id!(ModuleId, "ModuleId");
impl_numeric_id!(PermissionId, "PermissionId");
impl_numeric_id!(RoleId, "RoleId");

impl TenantId {
    /// Sentinel for a principal without a tenant claim.
    pub const NONE: TenantId = TenantId(0);

    pub const fn is_none(&self) -> bool {
        self.0 == 0
    }
}
