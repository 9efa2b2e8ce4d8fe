mod common;

use axum_test::TestServer;
use branded_links::domain::repositories::LinkRepository;
use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::Ordering;

#[tokio::test]
async fn test_health_endpoint_success() {
    let ctx = common::create_test_context();
    let server = TestServer::new(common::public_router(ctx.state.clone())).unwrap();

    let response = server.get("/health").await;

    response.assert_status_ok();

    let json = response.json::<Value>();
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["checks"]["storage"]["status"], "ok");
    assert_eq!(json["checks"]["visit_queue"]["status"], "ok");
    assert_eq!(json["checks"]["cache"]["status"], "ok");
    assert!(json.get("version").is_some());
}

#[tokio::test]
async fn test_health_degraded_when_queue_closed() {
    let ctx = common::create_test_context();
    let state = ctx.state.clone();
    drop(ctx.visit_rx);
    let server = TestServer::new(common::public_router(state)).unwrap();

    let response = server.get("/health").await;

    response.assert_status(axum::http::StatusCode::SERVICE_UNAVAILABLE);
    let json = response.json::<Value>();
    assert_eq!(json["status"], "degraded");
    assert_eq!(json["checks"]["visit_queue"]["status"], "error");
}

#[tokio::test]
async fn test_health_degraded_when_storage_down() {
    let links = Arc::new(common::FlakyLinkRepository::new());
    links.fail_lookups.store(true, Ordering::SeqCst);
    let ctx = common::create_test_context_with(
        common::repositories_with_links(links as Arc<dyn LinkRepository>),
        10,
    );
    let server = TestServer::new(common::public_router(ctx.state.clone())).unwrap();

    let response = server.get("/health").await;

    response.assert_status(axum::http::StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(response.json::<Value>()["checks"]["storage"]["status"], "error");
}
