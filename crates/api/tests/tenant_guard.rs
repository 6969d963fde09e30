//! Black-box tests for the request pipeline: claims augmentation, tenant
//! guard state machine, and the admin/menu surface.

use std::sync::Arc;

use chrono::{Duration as ChronoDuration, Utc};
use reqwest::StatusCode;
use serde_json::json;

use gatewise_api::app::{AppServices, InMemoryStores, build_app};
use gatewise_api::middleware::TenantGuardConfig;
use gatewise_auth::{
    Claim, ClaimsAugmentor, NullRoleSource, StaticTokenVerifier, SubjectEchoIdentity,
    ValidatedToken, claim_names,
};
use gatewise_core::{Module, ModuleId, ModuleKind, Permission, PermissionId, RoleId, Tenant, TenantId};
use gatewise_infra::RolePermissionStore;

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    /// Bind the same router as prod to an ephemeral port, seeded with the
    /// tenant/token fixtures below.
    async fn spawn() -> (Self, InMemoryStores) {
        let (services, stores) = AppServices::in_memory();
        seed(&stores);

        let verifier = Arc::new(
            StaticTokenVerifier::new()
                .insert(token("tok-7", "u7", Some("7")))
                .insert(token("tok-9", "u9", Some("9")))
                .insert(token("tok-5", "u5", Some("5")))
                .insert(token("tok-3", "u3", Some("3")))
                .insert(token("tok-2", "u2", Some("2")))
                .insert(token("tok-notenant", "u0", None)),
        );
        let augmentor = Arc::new(ClaimsAugmentor::new(
            Arc::new(NullRoleSource),
            Arc::new(SubjectEchoIdentity),
        ));

        let app = build_app(services, verifier, augmentor, TenantGuardConfig::new());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let base_url = format!("http://{}", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (Self { base_url, handle }, stores)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn token(raw: &str, subject: &str, tenant_id: Option<&str>) -> ValidatedToken {
    let mut claims = vec![Claim::new(claim_names::ROLE, "admin")];
    if let Some(id) = tenant_id {
        claims.push(Claim::new(claim_names::TENANT_ID, id));
    }
    ValidatedToken {
        raw: raw.to_string(),
        subject: subject.to_string(),
        claims,
    }
}

fn tenant(id: i32, active: bool, deleted: bool) -> Tenant {
    Tenant {
        id: TenantId::new(id),
        code: format!("t{id}"),
        name: format!("Tenant {id}"),
        is_active: active,
        is_deleted: deleted,
        subscription_valid: true,
        subscription_ends_at: None,
        enabled_modules: String::new(),
        max_users: 0,
        user_count: 0,
    }
}

fn seed(stores: &InMemoryStores) {
    // 7: healthy. 5: valid flag but end date yesterday. 3: inactive.
    // 2: soft-deleted. 9: intentionally absent.
    stores.tenants.upsert(tenant(7, true, false));
    let mut expired = tenant(5, true, false);
    expired.subscription_ends_at = Some(Utc::now() - ChronoDuration::days(1));
    stores.tenants.upsert(expired);
    stores.tenants.upsert(tenant(3, false, false));
    stores.tenants.upsert(tenant(2, true, true));

    stores.modules.seed(
        vec![
            Module {
                id: ModuleId::new(1),
                name: "administration".to_string(),
                sort_order: 1,
                is_active: true,
                kind: ModuleKind::Admin,
                parent_id: None,
            },
            Module {
                id: ModuleId::new(2),
                name: "user-management".to_string(),
                sort_order: 1,
                is_active: true,
                kind: ModuleKind::Feature,
                parent_id: Some(ModuleId::new(1)),
            },
        ],
        vec![Permission {
            id: PermissionId::new(10),
            name: "users.read".to_string(),
            description: "List users".to_string(),
            module_id: ModuleId::new(2),
        }],
    );

    stores
        .grants
        .seed(RoleId::new(1), &[PermissionId::new(1), PermissionId::new(2)]);
}

async fn guarded_get(srv: &TestServer, path: &str, token: &str) -> reqwest::Response {
    reqwest::Client::new()
        .get(format!("{}{}", srv.base_url, path))
        .bearer_auth(token)
        .send()
        .await
        .unwrap()
}

#[tokio::test]
async fn bypassed_paths_never_touch_the_tenant_store() {
    let (srv, stores) = TestServer::spawn().await;

    let res = guarded_get(&srv, "/health", "tok-7").await;
    assert_eq!(res.status(), StatusCode::OK);

    let res = reqwest::Client::new()
        .get(format!("{}/health", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    assert_eq!(stores.tenants.lookup_count(), 0);
}

#[tokio::test]
async fn unauthenticated_requests_pass_through_the_guard() {
    let (srv, _stores) = TestServer::spawn().await;

    let res = reqwest::Client::new()
        .get(format!("{}/whoami", srv.base_url))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["authenticated"], json!(false));
    assert_eq!(body["tenant"], json!(null));
}

#[tokio::test]
async fn missing_tenant_claim_is_rejected_with_the_envelope() {
    let (srv, _stores) = TestServer::spawn().await;

    let res = guarded_get(&srv, "/whoami", "tok-notenant").await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["Status"], "Failed");
    assert_eq!(body["ErrorCode"], "TENANT_REQUIRED");
    assert!(body.get("Message").is_some());
    assert!(body.get("Timestamp").is_some());
}

#[tokio::test]
async fn unknown_tenant_is_rejected_as_not_found() {
    let (srv, _stores) = TestServer::spawn().await;

    let res = guarded_get(&srv, "/whoami", "tok-9").await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["ErrorCode"], "TENANT_NOT_FOUND");
}

#[tokio::test]
async fn soft_deleted_tenant_reads_as_not_found() {
    let (srv, _stores) = TestServer::spawn().await;

    let res = guarded_get(&srv, "/whoami", "tok-2").await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["ErrorCode"], "TENANT_NOT_FOUND");
}

#[tokio::test]
async fn inactive_tenant_is_rejected_regardless_of_subscription() {
    let (srv, _stores) = TestServer::spawn().await;

    let res = guarded_get(&srv, "/whoami", "tok-3").await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["ErrorCode"], "TENANT_INACTIVE");
}

#[tokio::test]
async fn expired_subscription_maps_to_402() {
    let (srv, _stores) = TestServer::spawn().await;

    let res = guarded_get(&srv, "/whoami", "tok-5").await;
    assert_eq!(res.status(), StatusCode::PAYMENT_REQUIRED);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["ErrorCode"], "SUBSCRIPTION_EXPIRED");
}

#[tokio::test]
async fn accepted_request_carries_the_tenant_context() {
    let (srv, _stores) = TestServer::spawn().await;

    let res = guarded_get(&srv, "/whoami", "tok-7").await;
    assert_eq!(res.status(), StatusCode::OK);

    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["tenant"]["tenant_id"], json!(7));
    assert_eq!(body["tenant"]["tenant_code"], "t7");
    assert_eq!(body["tenant"]["tenant_name"], "Tenant 7");
    assert!(body["roles"].as_array().unwrap().iter().any(|r| r == "admin"));
}

#[tokio::test]
async fn upgrade_requests_get_a_status_only_rejection() {
    let (srv, _stores) = TestServer::spawn().await;

    let res = reqwest::Client::new()
        .get(format!("{}/whoami", srv.base_url))
        .bearer_auth("tok-notenant")
        .header("Upgrade", "websocket")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert!(res.text().await.unwrap().is_empty());
}

#[tokio::test]
async fn rejected_token_gets_a_bare_401() {
    let (srv, _stores) = TestServer::spawn().await;

    let res = guarded_get(&srv, "/whoami", "tok-forged").await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert!(res.text().await.unwrap().is_empty());
}

#[tokio::test]
async fn menu_returns_the_assembled_forest() {
    let (srv, _stores) = TestServer::spawn().await;

    let res = guarded_get(&srv, "/authz/menu", "tok-7").await;
    assert_eq!(res.status(), StatusCode::OK);

    let body: serde_json::Value = res.json().await.unwrap();
    let roots = body["menu"].as_array().unwrap();
    assert_eq!(roots.len(), 1);
    assert_eq!(roots[0]["name"], "administration");
    assert_eq!(roots[0]["children"][0]["name"], "user-management");
    assert_eq!(roots[0]["children"][0]["permissions"][0]["name"], "users.read");
}

#[tokio::test]
async fn role_grant_sync_applies_the_diff_end_to_end() {
    let (srv, stores) = TestServer::spawn().await;

    // Seeded with {1,2}; desire {2,3}.
    let res = reqwest::Client::new()
        .put(format!("{}/admin/roles/1/permissions", srv.base_url))
        .bearer_auth("tok-7")
        .json(&json!({ "permission_ids": [2, 3] }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["added"], 1);
    assert_eq!(body["removed"], 1);
    assert_eq!(body["kept"], 1);

    let granted = stores.grants.granted(RoleId::new(1)).await.unwrap();
    let expected = [PermissionId::new(2), PermissionId::new(3)]
        .into_iter()
        .collect();
    assert_eq!(granted, expected);
}
