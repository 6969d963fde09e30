//! Claims augmentation: post-validation enrichment of a bearer token's claims.
//!
//! Runs once per validated token. Role and identity claims come from the
//! token itself when present; otherwise from bounded-timeout store lookups
//! behind the [`RoleSource`] / [`IdentitySource`] seams. Lookup failures are
//! logged and swallowed — authentication success was already decided by the
//! external signature/expiry check, and a slow secondary store must not turn
//! into a full outage.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::time::timeout;

use crate::claims::{Claim, Principal, claim_names};

/// Upper bound on each secondary lookup, independent of the request deadline.
pub const LOOKUP_TIMEOUT: Duration = Duration::from_secs(5);

/// A token whose signature and expiry have already been verified upstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedToken {
    /// The raw bearer token as received on the wire.
    pub raw: String,
    /// Subject the token was issued to.
    pub subject: String,
    /// Claims decoded from the token.
    pub claims: Vec<Claim>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("token rejected: {0}")]
pub struct TokenRejected(pub String);

/// Seam for the external token-validation layer.
///
/// Implementations verify signature/expiry and decode claims; this crate
/// never does that itself.
pub trait TokenVerifier: Send + Sync {
    fn verify(&self, token: &str) -> Result<ValidatedToken, TokenRejected>;
}

/// Fixed token→claims table for tests and dev environments where real
/// verification happens upstream (e.g. at an API gateway).
#[derive(Debug, Default)]
pub struct StaticTokenVerifier {
    tokens: HashMap<String, ValidatedToken>,
}

impl StaticTokenVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(mut self, token: ValidatedToken) -> Self {
        self.tokens.insert(token.raw.clone(), token);
        self
    }
}

impl TokenVerifier for StaticTokenVerifier {
    fn verify(&self, token: &str) -> Result<ValidatedToken, TokenRejected> {
        self.tokens
            .get(token)
            .cloned()
            .ok_or_else(|| TokenRejected("unknown token".to_string()))
    }
}

/// Role lookup fallback for tokens that carry no role claims.
#[async_trait]
pub trait RoleSource: Send + Sync {
    async fn roles_for(&self, subject: &str) -> anyhow::Result<Vec<String>>;
}

/// Resolved identity attributes for a subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectIdentity {
    pub subject_id: String,
    pub display_name: Option<String>,
}

/// Identity lookup for subject id / display name claims.
#[async_trait]
pub trait IdentitySource: Send + Sync {
    async fn identity_for(&self, subject: &str) -> anyhow::Result<SubjectIdentity>;
}

/// Role source that knows no roles, for wirings where tokens always carry
/// their role claims.
pub struct NullRoleSource;

#[async_trait]
impl RoleSource for NullRoleSource {
    async fn roles_for(&self, _subject: &str) -> anyhow::Result<Vec<String>> {
        Ok(Vec::new())
    }
}

/// Identity source that echoes the token subject back as the subject id.
pub struct SubjectEchoIdentity;

#[async_trait]
impl IdentitySource for SubjectEchoIdentity {
    async fn identity_for(&self, subject: &str) -> anyhow::Result<SubjectIdentity> {
        Ok(SubjectIdentity {
            subject_id: subject.to_string(),
            display_name: None,
        })
    }
}

/// Enriches a validated token into a full [`Principal`].
pub struct ClaimsAugmentor {
    roles: Arc<dyn RoleSource>,
    identity: Arc<dyn IdentitySource>,
    lookup_timeout: Duration,
}

impl ClaimsAugmentor {
    pub fn new(roles: Arc<dyn RoleSource>, identity: Arc<dyn IdentitySource>) -> Self {
        Self {
            roles,
            identity,
            lookup_timeout: LOOKUP_TIMEOUT,
        }
    }

    /// Override the lookup bound (tests shrink it to milliseconds).
    pub fn with_lookup_timeout(mut self, lookup_timeout: Duration) -> Self {
        self.lookup_timeout = lookup_timeout;
        self
    }

    /// Produce the augmented principal for a validated token.
    ///
    /// Never fails: missing lookups degrade to a principal without the
    /// corresponding claims.
    pub async fn augment(&self, token: &ValidatedToken) -> Principal {
        let mut claims = Vec::with_capacity(token.claims.len() + 3);
        for claim in &token.claims {
            // Normalize the historical tenant-claim casing so downstream code
            // performs one lookup, not two.
            if claim.name == claim_names::TENANT_ID_LEGACY {
                claims.push(Claim::new(claim_names::TENANT_ID, claim.value.clone()));
            } else {
                claims.push(claim.clone());
            }
        }
        claims.push(Claim::new(claim_names::RAW_TOKEN, token.raw.clone()));

        let mut principal = Principal::authenticated(claims);

        if principal.roles().is_empty() {
            match timeout(self.lookup_timeout, self.roles.roles_for(&token.subject)).await {
                Ok(Ok(roles)) => {
                    for role in roles {
                        principal.push_claim(Claim::new(claim_names::ROLE, role));
                    }
                }
                Ok(Err(err)) => {
                    tracing::warn!(
                        subject = %token.subject,
                        error = %err,
                        "role lookup failed; continuing without role claims"
                    );
                }
                Err(_) => {
                    tracing::warn!(
                        subject = %token.subject,
                        "role lookup timed out; continuing without role claims"
                    );
                }
            }
        }

        if !principal.has_claim(claim_names::SUBJECT)
            || !principal.has_claim(claim_names::DISPLAY_NAME)
        {
            match timeout(self.lookup_timeout, self.identity.identity_for(&token.subject)).await {
                Ok(Ok(identity)) => {
                    if !principal.has_claim(claim_names::SUBJECT) {
                        principal.push_claim(Claim::new(claim_names::SUBJECT, identity.subject_id));
                    }
                    if !principal.has_claim(claim_names::DISPLAY_NAME) {
                        if let Some(display_name) = identity.display_name {
                            principal
                                .push_claim(Claim::new(claim_names::DISPLAY_NAME, display_name));
                        }
                    }
                }
                Ok(Err(err)) => {
                    tracing::warn!(
                        subject = %token.subject,
                        error = %err,
                        "identity lookup failed; continuing without identity claims"
                    );
                }
                Err(_) => {
                    tracing::warn!(
                        subject = %token.subject,
                        "identity lookup timed out; continuing without identity claims"
                    );
                }
            }
        }

        principal
    }
}
