//! HTTP routes. One thin surface over the core: identity echo, the
//! authorization/menu tree, and role-grant administration.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
};
use serde::Deserialize;

use gatewise_auth::{PermissionTree, Principal, claim_names};
use gatewise_core::{PermissionId, RoleId};
use gatewise_infra::{StoreError, query_key};

use crate::app::AppServices;
use crate::context::TenantContext;
use crate::errors;

const MENU_CACHE_TAG: &str = "module";
const MENU_CACHE_TTL: Duration = Duration::from_secs(60);

pub fn router() -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/whoami", get(whoami))
        .route("/authz/menu", get(menu))
        .route("/admin/roles/:id/permissions", put(put_role_permissions))
}

pub async fn health() -> axum::response::Response {
    Json(serde_json::json!({ "status": "ok" })).into_response()
}

/// Echo of the augmented principal and the guard-attached tenant context.
pub async fn whoami(
    Extension(principal): Extension<Principal>,
    tenant: Option<Extension<TenantContext>>,
) -> axum::response::Response {
    let tenant = tenant.map(|Extension(t)| {
        serde_json::json!({
            "tenant_id": t.tenant_id(),
            "tenant_code": t.tenant_code(),
            "tenant_name": t.tenant_name(),
        })
    });

    Json(serde_json::json!({
        "authenticated": principal.is_authenticated(),
        "subject": principal.claim(claim_names::SUBJECT),
        "display_name": principal.claim(claim_names::DISPLAY_NAME),
        "roles": principal.roles(),
        "tenant": tenant,
    }))
    .into_response()
}

/// The module/permission forest, cached under the `"module"` tag.
pub async fn menu(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    let modules = Arc::clone(&services.modules);
    let tree = services
        .cache
        .get_or_create(
            &query_key("Module", "active-menu-tree"),
            MENU_CACHE_TAG,
            Some(MENU_CACHE_TTL),
            || async move {
                let rows = modules.modules().await?;
                let permissions = modules.permissions().await?;
                let tree =
                    PermissionTree::build(&rows, &permissions).map_err(anyhow::Error::new)?;
                Ok(Arc::new(tree))
            },
        )
        .await;

    match tree {
        Ok(tree) => Json(serde_json::json!({ "menu": tree.roots() })).into_response(),
        Err(err) => {
            tracing::error!(error = %err, "failed to assemble permission tree");
            errors::json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "menu_unavailable",
                "failed to assemble the authorization menu",
            )
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SyncGrantsRequest {
    pub permission_ids: Vec<PermissionId>,
}

/// Reconcile a role's grants to the desired set.
pub async fn put_role_permissions(
    Extension(services): Extension<Arc<AppServices>>,
    Path(role_id): Path<i32>,
    Json(body): Json<SyncGrantsRequest>,
) -> axum::response::Response {
    match services
        .role_sync
        .sync(RoleId::new(role_id), &body.permission_ids)
        .await
    {
        Ok(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        Err(StoreError::Conflict(role)) => errors::json_error(
            StatusCode::CONFLICT,
            "conflict",
            format!("grants for role {role} changed concurrently; retry"),
        ),
        Err(err) => {
            tracing::error!(role = role_id, error = %err, "role grant sync failed");
            errors::json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "store_error",
                "failed to persist role grants",
            )
        }
    }
}
