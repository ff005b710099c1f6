//! Integration tests for health endpoints.

use actix_web::test;
use serde_json::Value;

use crate::helpers::TestServer;

#[actix_web::test]
async fn health_reports_healthy() {
    let server = TestServer::new();
    let app = server.app().await;

    let req = test::TestRequest::get().uri("/api/v1/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "healthy");
}

#[actix_web::test]
async fn ready_reports_database_connectivity() {
    let server = TestServer::new();
    let app = server.app().await;

    let req = test::TestRequest::get().uri("/api/v1/ready").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["database"], "connected");
}
