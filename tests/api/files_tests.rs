//! Integration tests for stored photo serving.

use actix_web::test;
use serde_json::Value;

use crate::helpers::*;

#[actix_web::test]
async fn stored_photo_is_served_with_image_content_type() {
    let server = TestServer::new();
    let app = server.app().await;

    let resp = post_submission(&app, valid_submission_body(b"jpeg bytes here")).await;
    assert_eq!(resp.status(), 201);
    let body: Value = test::read_body_json(resp).await;
    let id = body["submission_id"].as_str().unwrap().to_string();

    // Resolve a photo path through the detail view, as a client would.
    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/appraisals/{}", id))
        .to_request();
    let detail: Value = test::call_and_read_body_json(&app, req).await;
    let path = detail["resolved_photos"][0]["path"].as_str().unwrap().to_string();
    assert!(path.starts_with(&format!("/uploads/{}/", id)));

    let req = test::TestRequest::get().uri(&path).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    assert_eq!(
        resp.headers().get("content-type").unwrap(),
        "image/jpeg"
    );
    let bytes = test::read_body(resp).await;
    assert_eq!(&bytes[..], b"jpeg bytes here");
}

#[actix_web::test]
async fn unknown_file_is_not_found() {
    let server = TestServer::new();
    let app = server.app().await;

    let req = test::TestRequest::get()
        .uri("/uploads/00000000-0000-4000-8000-000000000000/missing.jpg")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);
}

#[actix_web::test]
async fn malformed_submission_id_is_not_found() {
    let server = TestServer::new();
    let app = server.app().await;

    let req = test::TestRequest::get()
        .uri("/uploads/not-a-uuid/photo.jpg")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);
}

#[actix_web::test]
async fn traversal_shaped_filenames_are_not_found() {
    let server = TestServer::new();
    let app = server.app().await;

    for filename in ["..", "..%2F..%2Fsecret", "a%5Cb.jpg"] {
        let req = test::TestRequest::get()
            .uri(&format!(
                "/uploads/00000000-0000-4000-8000-000000000000/{}",
                filename
            ))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 404, "filename {}", filename);
    }
}
