mod common;

use axum::http::StatusCode;
use axum_test::TestServer;
use branded_links::domain::entities::Role;
use branded_links::domain::repositories::{AdminRepository, TokenRepository};
use serde_json::{Value, json};

#[tokio::test]
async fn test_me_returns_identity() {
    let ctx = common::create_test_context();
    let (admin, token) = common::seed_account(&ctx, "ops@acme.test", Role::Admin).await;
    let server = TestServer::new(common::api_router(ctx.state.clone())).unwrap();

    let response = server
        .get("/api/me")
        .add_header("Authorization", common::bearer(&token))
        .await;

    response.assert_status_ok();
    let body = response.json::<Value>();
    assert_eq!(body["admin_id"], admin.id);
    assert_eq!(body["email"], "ops@acme.test");
    assert_eq!(body["role"], "admin");
}

#[tokio::test]
async fn test_revoked_token_is_rejected() {
    let ctx = common::create_test_context();
    let (admin, token) = common::seed_account(&ctx, "ops@acme.test", Role::Admin).await;
    let server = TestServer::new(common::api_router(ctx.state.clone())).unwrap();

    let issued = ctx.repos.tokens.list_tokens(Some(admin.id)).await.unwrap();
    ctx.repos.tokens.revoke_token(issued[0].id).await.unwrap();

    server
        .get("/api/me")
        .add_header("Authorization", common::bearer(&token))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_list_admins_requires_admin() {
    let ctx = common::create_test_context();
    let (_, admin_token) = common::seed_account(&ctx, "ops@acme.test", Role::Admin).await;
    let (_, user_token) = common::seed_account(&ctx, "viewer@acme.test", Role::User).await;
    let server = TestServer::new(common::api_router(ctx.state.clone())).unwrap();

    server
        .get("/api/admins")
        .add_header("Authorization", common::bearer(&user_token))
        .await
        .assert_status(StatusCode::FORBIDDEN);

    let response = server
        .get("/api/admins")
        .add_query_param("role", "user")
        .add_header("Authorization", common::bearer(&admin_token))
        .await;

    response.assert_status_ok();
    let body = response.json::<Value>();
    assert_eq!(body["total"], 1);
    assert_eq!(body["items"][0]["email"], "viewer@acme.test");
}

#[tokio::test]
async fn test_admin_can_create_plain_users_only() {
    let ctx = common::create_test_context();
    let (_, token) = common::seed_account(&ctx, "ops@acme.test", Role::Admin).await;
    let server = TestServer::new(common::api_router(ctx.state.clone())).unwrap();

    let response = server
        .post("/api/admins")
        .add_header("Authorization", common::bearer(&token))
        .json(&json!({ "email": "New.User@Acme.test", "name": "New User" }))
        .await;

    response.assert_status(StatusCode::CREATED);
    let body = response.json::<Value>();
    assert_eq!(body["email"], "new.user@acme.test");
    assert_eq!(body["role"], "user");

    server
        .post("/api/admins")
        .add_header("Authorization", common::bearer(&token))
        .json(&json!({ "email": "boss@acme.test", "name": "Boss", "role": "admin" }))
        .await
        .assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_duplicate_email_conflicts() {
    let ctx = common::create_test_context();
    let (_, token) = common::seed_account(&ctx, "root@acme.test", Role::SuperAdmin).await;
    let server = TestServer::new(common::api_router(ctx.state.clone())).unwrap();

    let response = server
        .post("/api/admins")
        .add_header("Authorization", common::bearer(&token))
        .json(&json!({ "email": "ROOT@acme.test", "name": "Again" }))
        .await;

    response.assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_super_admin_promotes_and_demotes() {
    let ctx = common::create_test_context();
    let (_, token) = common::seed_account(&ctx, "root@acme.test", Role::SuperAdmin).await;
    let (user, _) = common::seed_account(&ctx, "viewer@acme.test", Role::User).await;
    let server = TestServer::new(common::api_router(ctx.state.clone())).unwrap();

    let response = server
        .patch(&format!("/api/admins/{}", user.id))
        .add_header("Authorization", common::bearer(&token))
        .json(&json!({ "role": "admin" }))
        .await;

    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["role"], "admin");

    let stored = ctx.repos.admins.find_by_id(user.id).await.unwrap().unwrap();
    assert_eq!(stored.role, Role::Admin);
}

#[tokio::test]
async fn test_last_super_admin_cannot_be_demoted() {
    let ctx = common::create_test_context();
    let (root, token) = common::seed_account(&ctx, "root@acme.test", Role::SuperAdmin).await;
    let server = TestServer::new(common::api_router(ctx.state.clone())).unwrap();

    let response = server
        .patch(&format!("/api/admins/{}", root.id))
        .add_header("Authorization", common::bearer(&token))
        .json(&json!({ "role": "admin" }))
        .await;

    response.assert_status(StatusCode::CONFLICT);

    let stored = ctx.repos.admins.find_by_id(root.id).await.unwrap().unwrap();
    assert_eq!(stored.role, Role::SuperAdmin);
}

#[tokio::test]
async fn test_second_super_admin_can_demote_first() {
    let ctx = common::create_test_context();
    let (first, _) = common::seed_account(&ctx, "first@acme.test", Role::SuperAdmin).await;
    let (_, token) = common::seed_account(&ctx, "second@acme.test", Role::SuperAdmin).await;
    let server = TestServer::new(common::api_router(ctx.state.clone())).unwrap();

    server
        .patch(&format!("/api/admins/{}", first.id))
        .add_header("Authorization", common::bearer(&token))
        .json(&json!({ "role": "user" }))
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn test_cannot_delete_own_account() {
    let ctx = common::create_test_context();
    let (root, token) = common::seed_account(&ctx, "root@acme.test", Role::SuperAdmin).await;
    let server = TestServer::new(common::api_router(ctx.state.clone())).unwrap();

    server
        .delete(&format!("/api/admins/{}", root.id))
        .add_header("Authorization", common::bearer(&token))
        .await
        .assert_status_bad_request();
}

#[tokio::test]
async fn test_admin_cannot_delete_privileged_account() {
    let ctx = common::create_test_context();
    let (root, _) = common::seed_account(&ctx, "root@acme.test", Role::SuperAdmin).await;
    let (_, token) = common::seed_account(&ctx, "ops@acme.test", Role::Admin).await;
    let server = TestServer::new(common::api_router(ctx.state.clone())).unwrap();

    server
        .delete(&format!("/api/admins/{}", root.id))
        .add_header("Authorization", common::bearer(&token))
        .await
        .assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_deleted_account_tokens_stop_working() {
    let ctx = common::create_test_context();
    let (_, root_token) = common::seed_account(&ctx, "root@acme.test", Role::SuperAdmin).await;
    let (user, user_token) = common::seed_account(&ctx, "viewer@acme.test", Role::User).await;
    let server = TestServer::new(common::api_router(ctx.state.clone())).unwrap();

    server
        .delete(&format!("/api/admins/{}", user.id))
        .add_header("Authorization", common::bearer(&root_token))
        .await
        .assert_status(StatusCode::NO_CONTENT);

    server
        .get("/api/me")
        .add_header("Authorization", common::bearer(&user_token))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_bootstrap_creates_usable_super_admin() {
    let ctx = common::create_test_context();
    let server = TestServer::new(common::api_router(ctx.state.clone())).unwrap();

    let admin = ctx
        .state
        .admin_service
        .bootstrap("Root@Acme.test", "bootstrap-token-value")
        .await
        .unwrap();
    assert_eq!(admin.role, Role::SuperAdmin);

    // Running it again on the next start is a no-op
    let again = ctx
        .state
        .admin_service
        .bootstrap("root@acme.test", "bootstrap-token-value")
        .await
        .unwrap();
    assert_eq!(again.id, admin.id);

    let response = server
        .get("/api/me")
        .add_header("Authorization", common::bearer("bootstrap-token-value"))
        .await;

    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["role"], "super_admin");
}
