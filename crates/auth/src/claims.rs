//! Claims model (transport-agnostic).
//!
//! A [`Principal`] is a bag of name/value claims plus an authenticated flag.
//! Claim names are opaque strings; the canonical names this system reads and
//! writes live in [`claim_names`].

use serde::{Deserialize, Serialize};

use gatewise_core::TenantId;

/// Canonical claim names.
pub mod claim_names {
    /// The raw bearer token, kept for later retrieval by other components.
    pub const RAW_TOKEN: &str = "rawToken";

    /// RBAC role (repeatable).
    pub const ROLE: &str = "role";

    /// Subject identifier.
    pub const SUBJECT: &str = "sub";

    /// Human-readable display name.
    pub const DISPLAY_NAME: &str = "name";

    /// Canonical tenant-id claim name.
    pub const TENANT_ID: &str = "tenantId";

    /// Historically issued casing of the tenant-id claim. Accepted on read,
    /// rewritten to [`TENANT_ID`] during augmentation.
    pub const TENANT_ID_LEGACY: &str = "TenantId";
}

/// A single name/value claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
    pub name: String,
    pub value: String,
}

impl Claim {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// An authenticated (or anonymous) caller identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    authenticated: bool,
    claims: Vec<Claim>,
}

impl Principal {
    /// An unauthenticated caller with no claims.
    pub fn anonymous() -> Self {
        Self {
            authenticated: false,
            claims: Vec::new(),
        }
    }

    pub fn authenticated(claims: Vec<Claim>) -> Self {
        Self {
            authenticated: true,
            claims,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    /// First claim value under `name`, if any.
    pub fn claim(&self, name: &str) -> Option<&str> {
        self.claims
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.value.as_str())
    }

    /// All claim values under `name` (e.g. repeated role claims).
    pub fn claims_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> {
        self.claims
            .iter()
            .filter(move |c| c.name == name)
            .map(|c| c.value.as_str())
    }

    pub fn has_claim(&self, name: &str) -> bool {
        self.claims.iter().any(|c| c.name == name)
    }

    pub fn push_claim(&mut self, claim: Claim) {
        self.claims.push(claim);
    }

    /// Role claim values.
    pub fn roles(&self) -> Vec<&str> {
        self.claims_named(claim_names::ROLE).collect()
    }

    pub fn claims(&self) -> &[Claim] {
        &self.claims
    }
}

/// Tenant id carried by a principal's claims.
///
/// Reads the canonical claim name first, then the legacy casing. Returns
/// [`TenantId::NONE`] when the claim is absent, unparseable, or the principal
/// is anonymous. Pure and infallible.
pub fn tenant_id_from(principal: &Principal) -> TenantId {
    let raw = principal
        .claim(claim_names::TENANT_ID)
        .or_else(|| principal.claim(claim_names::TENANT_ID_LEGACY));

    match raw.and_then(|value| value.trim().parse::<i32>().ok()) {
        Some(id) => TenantId::new(id),
        None => TenantId::NONE,
    }
}
