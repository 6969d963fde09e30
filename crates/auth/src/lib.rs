//! `gatewise-auth` — authentication/authorization boundary (zero-trust).
//!
//! This crate is intentionally decoupled from HTTP and storage. It models
//! claims and principals, augments validated tokens with derived claims, and
//! assembles the module/permission tree used for authorization decisions.
//! Token signature/expiry verification lives behind the [`TokenVerifier`]
//! seam; it is performed by an external layer.

pub mod augment;
pub mod claims;
pub mod tree;

pub use augment::{
    ClaimsAugmentor, IdentitySource, LOOKUP_TIMEOUT, NullRoleSource, RoleSource,
    StaticTokenVerifier, SubjectEchoIdentity, SubjectIdentity, TokenRejected, TokenVerifier,
    ValidatedToken,
};
pub use claims::{Claim, Principal, claim_names, tenant_id_from};
pub use tree::{ModuleNode, PermissionNode, PermissionTree, TreeError};
