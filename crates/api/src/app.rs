//! Application wiring (axum router + service construction).
//!
//! All collaborators are injected through constructors and `Extension`
//! layers; there is no global service locator.

use std::sync::Arc;

use axum::{Extension, Router};

use gatewise_auth::{ClaimsAugmentor, TokenVerifier};
use gatewise_infra::{
    CacheGateway, InMemoryModuleStore, InMemoryRolePermissionStore, InMemoryTenantStore,
    ModuleStore, RolePermissionSync, TenantResolver,
};

use crate::middleware::{self, AuthState, GuardState, TenantGuardConfig};
use crate::routes;

const CACHE_CAPACITY: u64 = 8_192;

/// Shared service graph handed to handlers via `Extension`.
pub struct AppServices {
    pub cache: Arc<CacheGateway>,
    pub modules: Arc<dyn ModuleStore>,
    pub resolver: Arc<TenantResolver>,
    pub role_sync: Arc<RolePermissionSync>,
}

/// Concrete in-memory stores, kept so callers (tests, dev main) can seed and
/// inspect them after wiring.
pub struct InMemoryStores {
    pub tenants: Arc<InMemoryTenantStore>,
    pub modules: Arc<InMemoryModuleStore>,
    pub grants: Arc<InMemoryRolePermissionStore>,
}

impl AppServices {
    /// Wire the full service graph over in-memory stores.
    pub fn in_memory() -> (Arc<Self>, InMemoryStores) {
        let cache = Arc::new(CacheGateway::new(CACHE_CAPACITY));
        let tenants = Arc::new(InMemoryTenantStore::new());
        let modules = Arc::new(InMemoryModuleStore::new());
        let grants = Arc::new(InMemoryRolePermissionStore::new());

        let resolver = Arc::new(TenantResolver::new(tenants.clone(), cache.clone()));
        let role_sync = Arc::new(RolePermissionSync::new(grants.clone()));

        let modules_dyn: Arc<dyn ModuleStore> = modules.clone();
        let services = Arc::new(Self {
            cache,
            modules: modules_dyn,
            resolver,
            role_sync,
        });
        let stores = InMemoryStores {
            tenants,
            modules,
            grants,
        };
        (services, stores)
    }
}

/// Build the full HTTP router (public entrypoint used by `main.rs` and the
/// black-box tests).
pub fn build_app(
    services: Arc<AppServices>,
    verifier: Arc<dyn TokenVerifier>,
    augmentor: Arc<ClaimsAugmentor>,
    guard_config: TenantGuardConfig,
) -> Router {
    let auth_state = AuthState {
        verifier,
        augmentor,
    };
    let guard_state = GuardState {
        resolver: services.resolver.clone(),
        config: Arc::new(guard_config),
    };

    // Layer order: claims augmentation runs first (outermost), then the
    // tenant guard, then the service Extension for handlers.
    routes::router()
        .layer(Extension(services))
        .layer(axum::middleware::from_fn_with_state(
            guard_state,
            middleware::tenant_guard,
        ))
        .layer(axum::middleware::from_fn_with_state(
            auth_state,
            middleware::claims_middleware,
        ))
}
