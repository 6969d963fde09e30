use gatewise_core::TenantId;

/// Tenant context attached to every request the guard lets through.
///
/// Immutable; downstream handlers read it via `Extension<TenantContext>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantContext {
    tenant_id: TenantId,
    tenant_code: String,
    tenant_name: String,
}

impl TenantContext {
    pub fn new(tenant_id: TenantId, tenant_code: String, tenant_name: String) -> Self {
        Self {
            tenant_id,
            tenant_code,
            tenant_name,
        }
    }

    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    pub fn tenant_code(&self) -> &str {
        &self.tenant_code
    }

    pub fn tenant_name(&self) -> &str {
        &self.tenant_name
    }
}
