//! Integration tests for the back-office list and delete endpoints.

use actix_web::test;
use serde_json::{json, Value};

use crate::helpers::*;

async fn submit_one<S>(app: &S) -> String
where
    S: actix_web::dev::Service<
        actix_http::Request,
        Response = actix_web::dev::ServiceResponse,
        Error = actix_web::Error,
    >,
{
    let resp = post_submission(app, valid_submission_body(b"jpeg")).await;
    assert_eq!(resp.status(), 201);
    let body: Value = test::read_body_json(resp).await;
    body["submission_id"].as_str().expect("id").to_string()
}

#[actix_web::test]
async fn list_requires_admin_key() {
    let server = TestServer::new();
    let app = server.app().await;

    let req = test::TestRequest::get()
        .uri("/api/v1/admin/appraisals")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);

    let req = test::TestRequest::get()
        .uri("/api/v1/admin/appraisals")
        .insert_header(("X-Admin-Key", "wrong-key"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);

    let req = test::TestRequest::get()
        .uri("/api/v1/admin/appraisals")
        .insert_header(("X-Admin-Key", TEST_ADMIN_KEY))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
}

#[actix_web::test]
async fn list_projects_summaries_newest_first() {
    let server = TestServer::new();
    let app = server.app().await;

    let first = submit_one(&app).await;
    // Stored timestamps have microsecond precision; keep the two rows apart.
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let second = submit_one(&app).await;

    let req = test::TestRequest::get()
        .uri("/api/v1/admin/appraisals")
        .insert_header(("X-Admin-Key", TEST_ADMIN_KEY))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["total"], 2);
    let appraisals = body["appraisals"].as_array().unwrap();
    assert_eq!(appraisals[0]["id"], second.as_str());
    assert_eq!(appraisals[1]["id"], first.as_str());

    // Summary projection only: vehicle/contact columns, no photo data.
    let summary = &appraisals[0];
    assert_eq!(summary["make"], "Honda");
    assert_eq!(summary["name"], "Jane Doe");
    assert!(summary.get("photos").is_none());
    assert!(summary.get("condition").is_none());
}

#[actix_web::test]
async fn delete_removes_record_and_files_idempotently() {
    let server = TestServer::new();
    let app = server.app().await;

    let id = submit_one(&app).await;
    assert!(server.submission_dir(&id).exists());

    let delete = || {
        test::TestRequest::post()
            .uri("/api/v1/admin/appraisals/delete")
            .insert_header(("X-Admin-Key", TEST_ADMIN_KEY))
            .set_json(json!({ "id": id }))
            .to_request()
    };

    // First delete removes row and directory.
    let resp = test::call_service(&app, delete()).await;
    assert_eq!(resp.status(), 200);
    assert!(!server.submission_dir(&id).exists());

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/appraisals/{}", id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);

    // Second delete of the same id succeeds as well.
    let resp = test::call_service(&app, delete()).await;
    assert_eq!(resp.status(), 200);
}

#[actix_web::test]
async fn delete_requires_admin_key() {
    let server = TestServer::new();
    let app = server.app().await;

    let req = test::TestRequest::post()
        .uri("/api/v1/admin/appraisals/delete")
        .set_json(json!({ "id": "00000000-0000-4000-8000-000000000000" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);
}

#[actix_web::test]
async fn delete_rejects_malformed_id() {
    let server = TestServer::new();
    let app = server.app().await;

    let req = test::TestRequest::post()
        .uri("/api/v1/admin/appraisals/delete")
        .insert_header(("X-Admin-Key", TEST_ADMIN_KEY))
        .set_json(json!({ "id": "../../etc" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
}
