//! Request pipeline middleware: claims augmentation and the tenant guard.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{HeaderMap, Method, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::Utc;

use gatewise_auth::{ClaimsAugmentor, Principal, TokenVerifier, tenant_id_from};
use gatewise_infra::TenantResolver;

use crate::context::TenantContext;
use crate::errors::{codes, reject};

// ─────────────────────────────────────────────────────────────────────────────
// Claims augmentation
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct AuthState {
    pub verifier: Arc<dyn TokenVerifier>,
    pub augmentor: Arc<ClaimsAugmentor>,
}

/// Verify the bearer token (external layer's decision) and attach the
/// augmented [`Principal`] to the request.
///
/// No bearer header means an anonymous principal, not a rejection —
/// authorization is enforced elsewhere. A present-but-rejected token gets a
/// bare 401 challenge with no body, which keeps upgraded/streaming
/// connections safe.
pub async fn claims_middleware(
    State(state): State<AuthState>,
    mut req: Request,
    next: Next,
) -> Response {
    let principal = match extract_bearer(req.headers()) {
        None => Principal::anonymous(),
        Some(token) => match state.verifier.verify(token) {
            Ok(validated) => state.augmentor.augment(&validated).await,
            Err(err) => {
                tracing::debug!(error = %err, "bearer token rejected");
                return StatusCode::UNAUTHORIZED.into_response();
            }
        },
    };

    req.extensions_mut().insert(principal);
    next.run(req).await
}

fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    let header = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = header.strip_prefix("Bearer ")?.trim();
    if token.is_empty() { None } else { Some(token) }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tenant guard
// ─────────────────────────────────────────────────────────────────────────────

/// Path prefixes the guard passes through untouched.
///
/// Matching is by case-insensitive prefix; CORS preflights (`OPTIONS`) always
/// bypass. The default set covers the unauthenticated surface plus the
/// tenant-administration root, and is extensible at wiring time.
#[derive(Debug, Clone)]
pub struct TenantGuardConfig {
    excluded_prefixes: Vec<String>,
}

impl TenantGuardConfig {
    pub fn new() -> Self {
        Self {
            excluded_prefixes: [
                "/auth/login",
                "/auth/register",
                "/auth/forgot-password",
                "/auth/reset-password",
                "/auth/refresh-token",
                "/health",
                "/docs",
                "/tenant-admin",
            ]
            .iter()
            .map(|p| p.to_ascii_lowercase())
            .collect(),
        }
    }

    pub fn exclude_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.excluded_prefixes.push(prefix.into().to_ascii_lowercase());
        self
    }

    pub fn is_excluded(&self, path: &str) -> bool {
        let path = path.to_ascii_lowercase();
        self.excluded_prefixes
            .iter()
            .any(|prefix| path.starts_with(prefix))
    }
}

impl Default for TenantGuardConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone)]
pub struct GuardState {
    pub resolver: Arc<TenantResolver>,
    pub config: Arc<TenantGuardConfig>,
}

/// Per-request tenant-isolation state machine, evaluated strictly in order:
/// bypass → unauthenticated pass-through → the tenant rejection states →
/// attach context and continue.
///
/// Rejections are produced only *before* the inner service runs; a response
/// coming back from an inner handler is forwarded untouched, so the guard can
/// never write a second response on top of an upstream one.
pub async fn tenant_guard(State(state): State<GuardState>, mut req: Request, next: Next) -> Response {
    if req.method() == Method::OPTIONS || state.config.is_excluded(req.uri().path()) {
        return next.run(req).await;
    }

    let principal = match req.extensions().get::<Principal>() {
        Some(principal) => principal.clone(),
        None => Principal::anonymous(),
    };
    if !principal.is_authenticated() {
        return next.run(req).await;
    }

    // For upgraded/streaming connections only the status line goes out.
    let suppress_body = is_upgrade_request(req.headers());

    let tenant_id = tenant_id_from(&principal);
    if tenant_id.is_none() {
        tracing::debug!(path = %req.uri().path(), "authenticated request without tenant claim");
        return reject(
            StatusCode::FORBIDDEN,
            codes::TENANT_REQUIRED,
            "A tenant context is required for this request",
            suppress_body,
        );
    }

    let tenant = match state.resolver.tenant_by_id(tenant_id).await {
        Ok(found) => found,
        Err(err) => {
            // Detail stays server-side; the body carries a generic message.
            tracing::error!(tenant = %tenant_id, error = %err, "tenant resolution failed");
            return reject(
                StatusCode::INTERNAL_SERVER_ERROR,
                codes::TENANT_VALIDATION_ERROR,
                "Tenant validation failed",
                suppress_body,
            );
        }
    };

    let tenant = match tenant.filter(|t| !t.is_deleted) {
        Some(tenant) => tenant,
        None => {
            return reject(
                StatusCode::FORBIDDEN,
                codes::TENANT_NOT_FOUND,
                "The requested tenant does not exist",
                suppress_body,
            );
        }
    };

    if !tenant.is_active {
        return reject(
            StatusCode::FORBIDDEN,
            codes::TENANT_INACTIVE,
            "The tenant is not active",
            suppress_body,
        );
    }

    if !tenant.subscription_is_valid(Utc::now()) {
        return reject(
            StatusCode::PAYMENT_REQUIRED,
            codes::SUBSCRIPTION_EXPIRED,
            "The tenant's subscription has expired",
            suppress_body,
        );
    }

    req.extensions_mut().insert(TenantContext::new(
        tenant.id,
        tenant.code.clone(),
        tenant.name.clone(),
    ));
    next.run(req).await
}

fn is_upgrade_request(headers: &HeaderMap) -> bool {
    if headers.contains_key(header::UPGRADE) {
        return true;
    }
    headers
        .get(header::CONNECTION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.to_ascii_lowercase().contains("upgrade"))
}
