//! Cache-backed tenant resolution.
//!
//! The pure claim-reading half lives in `gatewise-auth`
//! ([`tenant_id_from`]); this resolver adds the store lookup, fronted by the
//! process-wide [`CacheGateway`] under the `"tenant"` tag so administrative
//! tenant mutations can evict in bulk.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use gatewise_auth::{Principal, tenant_id_from};
use gatewise_core::{Tenant, TenantId};

use crate::cache::{CacheError, CacheGateway};
use crate::store::TenantStore;

/// Tag under which all tenant cache entries are registered.
pub const TENANT_CACHE_TAG: &str = "tenant";

const TENANT_CACHE_TTL: Duration = Duration::from_secs(300);

pub struct TenantResolver {
    tenants: Arc<dyn TenantStore>,
    cache: Arc<CacheGateway>,
    cache_ttl: Option<Duration>,
}

impl TenantResolver {
    pub fn new(tenants: Arc<dyn TenantStore>, cache: Arc<CacheGateway>) -> Self {
        Self {
            tenants,
            cache,
            cache_ttl: Some(TENANT_CACHE_TTL),
        }
    }

    /// Tenant id claimed by the principal; [`TenantId::NONE`] when absent.
    /// Pure, side-effect-free, never errors.
    pub fn current_tenant_id(&self, principal: &Principal) -> TenantId {
        tenant_id_from(principal)
    }

    /// Full tenant record for the principal's claim, filtered to active and
    /// non-deleted; `None` for the 0 sentinel or an unknown/unusable tenant.
    pub async fn current_tenant(
        &self,
        principal: &Principal,
    ) -> Result<Option<Tenant>, CacheError> {
        let id = tenant_id_from(principal);
        if id.is_none() {
            return Ok(None);
        }
        Ok(self.tenant_by_id(id).await?.filter(|t| t.is_usable()))
    }

    /// Unfiltered record lookup (soft-deleted/inactive included), cached.
    ///
    /// The guard needs the raw record to tell "not found" apart from
    /// "inactive".
    pub async fn tenant_by_id(&self, id: TenantId) -> Result<Option<Tenant>, CacheError> {
        let key = format!("tenant:{id}");
        let tenants = Arc::clone(&self.tenants);
        self.cache
            .get_or_create(&key, TENANT_CACHE_TAG, self.cache_ttl, || async move {
                Ok(tenants.find(id).await?)
            })
            .await
    }

    /// Subscription validity per the tenant's own invariant (flag AND date).
    pub fn subscription_valid(tenant: &Tenant, now: DateTime<Utc>) -> bool {
        tenant.subscription_is_valid(now)
    }
}
