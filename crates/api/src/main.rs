use std::sync::Arc;

use gatewise_api::app::{AppServices, build_app};
use gatewise_api::middleware::TenantGuardConfig;
use gatewise_auth::{
    Claim, ClaimsAugmentor, NullRoleSource, StaticTokenVerifier, SubjectEchoIdentity,
    ValidatedToken, claim_names,
};
use gatewise_core::{Tenant, TenantId};

#[tokio::main]
async fn main() {
    gatewise_observability::init();

    let (services, stores) = AppServices::in_memory();
    tracing::warn!("using in-memory stores and the static dev token verifier; dev use only");

    stores.tenants.upsert(Tenant {
        id: TenantId::new(1),
        code: "dev".to_string(),
        name: "Development Tenant".to_string(),
        is_active: true,
        is_deleted: false,
        subscription_valid: true,
        subscription_ends_at: None,
        enabled_modules: String::new(),
        max_users: 0,
        user_count: 0,
    });

    let verifier = Arc::new(StaticTokenVerifier::new().insert(ValidatedToken {
        raw: "dev-token".to_string(),
        subject: "dev".to_string(),
        claims: vec![
            Claim::new(claim_names::TENANT_ID, "1"),
            Claim::new(claim_names::ROLE, "admin"),
        ],
    }));
    let augmentor = Arc::new(ClaimsAugmentor::new(
        Arc::new(NullRoleSource),
        Arc::new(SubjectEchoIdentity),
    ));

    let app = build_app(services, verifier, augmentor, TenantGuardConfig::new());

    let listener = tokio::net::TcpListener::bind("0.0.0.0:8080")
        .await
        .expect("failed to bind 0.0.0.0:8080");

    tracing::info!("listening on {}", listener.local_addr().expect("local addr"));

    axum::serve(listener, app).await.expect("server error");
}
