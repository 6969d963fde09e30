//! Module/permission tree assembly.
//!
//! Builds a rooted forest from flat [`Module`] rows. Nodes are kept in an
//! arena keyed by id with parent-by-id references; the externalized
//! [`ModuleNode`] projection carries `children` but deliberately no parent
//! reference, so serializing or caching a subtree can never re-traverse a
//! cycle. Acyclicity of the raw rows is validated once at build time.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use thiserror::Error;

use gatewise_core::{Module, ModuleId, ModuleKind, Permission, PermissionId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TreeError {
    /// The parent chain starting at this module revisits a node.
    #[error("module {0} sits on a cyclic parent chain")]
    Cycle(ModuleId),
}

/// A permission as exposed on the tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PermissionNode {
    pub id: PermissionId,
    pub name: String,
    pub description: String,
}

/// One level of the externalized module forest.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModuleNode {
    pub id: ModuleId,
    pub name: String,
    pub kind: ModuleKind,
    pub sort_order: i32,
    /// Permissions owned directly by this module.
    pub permissions: Vec<PermissionNode>,
    /// Child modules, ordered by `sort_order` ascending, ties by id.
    pub children: Vec<ModuleNode>,
}

/// The assembled authorization forest plus a flat module→permission index
/// for answering grant queries without walking the tree.
#[derive(Debug, Clone)]
pub struct PermissionTree {
    roots: Vec<ModuleNode>,
    owned: HashMap<ModuleId, HashSet<PermissionId>>,
}

impl PermissionTree {
    /// Assemble the forest from flat rows.
    ///
    /// Inactive modules are excluded; a node whose parent is missing or
    /// inactive becomes a root. Cycles anywhere in the raw rows (active or
    /// not) are rejected.
    pub fn build(modules: &[Module], permissions: &[Permission]) -> Result<Self, TreeError> {
        Self::validate_acyclic(modules)?;

        let active: HashMap<ModuleId, &Module> = modules
            .iter()
            .filter(|m| m.is_active)
            .map(|m| (m.id, m))
            .collect();

        let mut perms_of: HashMap<ModuleId, Vec<&Permission>> = HashMap::new();
        for permission in permissions {
            perms_of.entry(permission.module_id).or_default().push(permission);
        }

        let mut children_of: HashMap<ModuleId, Vec<ModuleId>> = HashMap::new();
        let mut root_ids: Vec<ModuleId> = Vec::new();
        for module in active.values() {
            match module.parent_id.filter(|pid| active.contains_key(pid)) {
                Some(parent_id) => children_of.entry(parent_id).or_default().push(module.id),
                None => root_ids.push(module.id),
            }
        }

        let owned = active
            .keys()
            .map(|id| {
                let ids = perms_of
                    .get(id)
                    .map(|ps| ps.iter().map(|p| p.id).collect())
                    .unwrap_or_default();
                (*id, ids)
            })
            .collect();

        sort_siblings(&mut root_ids, &active);
        let roots = root_ids
            .iter()
            .filter_map(|id| active.get(id).copied())
            .map(|module| assemble(module, &active, &children_of, &perms_of))
            .collect();

        Ok(Self { roots, owned })
    }

    /// Top-level nodes, ordered.
    pub fn roots(&self) -> &[ModuleNode] {
        &self.roots
    }

    /// Depth-first lookup of a node by module id.
    pub fn find(&self, id: ModuleId) -> Option<&ModuleNode> {
        fn dfs(nodes: &[ModuleNode], id: ModuleId) -> Option<&ModuleNode> {
            for node in nodes {
                if node.id == id {
                    return Some(node);
                }
                if let Some(found) = dfs(&node.children, id) {
                    return Some(found);
                }
            }
            None
        }
        dfs(&self.roots, id)
    }

    /// Does a role holding `granted` have `permission` on `module`?
    ///
    /// True only when the permission is both owned by the module and present
    /// in the granted set.
    pub fn role_has_permission(
        &self,
        granted: &HashSet<PermissionId>,
        module: ModuleId,
        permission: PermissionId,
    ) -> bool {
        self.owned
            .get(&module)
            .is_some_and(|owned| owned.contains(&permission))
            && granted.contains(&permission)
    }

    fn validate_acyclic(modules: &[Module]) -> Result<(), TreeError> {
        let parent_of: HashMap<ModuleId, Option<ModuleId>> =
            modules.iter().map(|m| (m.id, m.parent_id)).collect();

        for module in modules {
            let mut seen = HashSet::new();
            seen.insert(module.id);
            let mut cursor = module.id;
            while let Some(parent) = parent_of.get(&cursor).copied().flatten() {
                if !seen.insert(parent) {
                    return Err(TreeError::Cycle(module.id));
                }
                cursor = parent;
            }
        }
        Ok(())
    }
}

fn assemble(
    module: &Module,
    active: &HashMap<ModuleId, &Module>,
    children_of: &HashMap<ModuleId, Vec<ModuleId>>,
    perms_of: &HashMap<ModuleId, Vec<&Permission>>,
) -> ModuleNode {
    let mut permissions: Vec<PermissionNode> = perms_of
        .get(&module.id)
        .map(|ps| {
            ps.iter()
                .map(|p| PermissionNode {
                    id: p.id,
                    name: p.name.clone(),
                    description: p.description.clone(),
                })
                .collect()
        })
        .unwrap_or_default();
    permissions.sort_by_key(|p| p.id);

    let mut child_ids = children_of.get(&module.id).cloned().unwrap_or_default();
    sort_siblings(&mut child_ids, active);
    let children = child_ids
        .iter()
        .filter_map(|id| active.get(id).copied())
        .map(|child| assemble(child, active, children_of, perms_of))
        .collect();

    ModuleNode {
        id: module.id,
        name: module.name.clone(),
        kind: module.kind,
        sort_order: module.sort_order,
        permissions,
        children,
    }
}

fn sort_siblings(ids: &mut [ModuleId], active: &HashMap<ModuleId, &Module>) {
    ids.sort_by_key(|id| {
        (
            active.get(id).map(|m| m.sort_order).unwrap_or_default(),
            *id,
        )
    });
}
