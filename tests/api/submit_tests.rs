//! Integration tests for the submission endpoint and record viewer.

use actix_web::test;
use serde_json::Value;

use crate::helpers::*;

#[actix_web::test]
async fn submit_valid_form_returns_id_and_record_is_retrievable() {
    let server = TestServer::new();
    let app = server.app().await;

    // 2MB jpeg-ish payload, per the canonical scenario.
    let photo = vec![0xFFu8; 2 * 1024 * 1024];
    let resp = post_submission(&app, valid_submission_body(&photo)).await;
    assert_eq!(resp.status(), 201);

    let body: Value = test::read_body_json(resp).await;
    let id = body["submission_id"].as_str().expect("id present").to_string();
    assert!(!id.is_empty());

    // The detail view shows the stored record.
    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/appraisals/{}", id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let detail: Value = test::read_body_json(resp).await;
    assert_eq!(detail["appraisal"]["make"], "Honda");
    assert_eq!(detail["appraisal"]["year"], 2003);
    assert_eq!(
        detail["appraisal"]["condition"]["accident_history"]["answer"],
        "yes"
    );

    let photos = detail["resolved_photos"].as_array().expect("photos");
    assert_eq!(photos.len(), REQUIRED_SLOTS.len());
    assert!(photos
        .iter()
        .any(|p| p["label"] == "Front of Vehicle" && p["slot"] == "driver_front_corner"));

    // The photo directory contains exactly the uploaded files.
    let entries = std::fs::read_dir(server.submission_dir(&id))
        .expect("submission dir")
        .count();
    assert_eq!(entries, REQUIRED_SLOTS.len());
}

#[actix_web::test]
async fn submit_sends_notification_to_back_office_and_submitter() {
    let server = TestServer::new();
    let app = server.app().await;

    let resp = post_submission(&app, valid_submission_body(b"jpeg")).await;
    assert_eq!(resp.status(), 201);

    let sent = server.mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(
        sent[0].to,
        vec![
            "backoffice@tradein.example.com".to_string(),
            "jane@example.com".to_string()
        ]
    );
    assert_eq!(sent[0].subject, "New Appraisal Request: 2003 Honda Accord");
    assert!(sent[0].html.contains("/appraisals/"));
}

#[actix_web::test]
async fn notification_failure_still_reports_success() {
    let server = TestServer::with_failing_mailer();
    let app = server.app().await;

    let resp = post_submission(&app, valid_submission_body(b"jpeg")).await;
    assert_eq!(resp.status(), 201);

    let body: Value = test::read_body_json(resp).await;
    let id = body["submission_id"].as_str().expect("id");

    // The record is durable despite the delivery failure.
    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/appraisals/{}", id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
}

#[actix_web::test]
async fn missing_email_configuration_fails_before_any_side_effect() {
    let server = TestServer::without_email_config();
    let app = server.app().await;

    let resp = post_submission(&app, valid_submission_body(b"jpeg")).await;
    assert_eq!(resp.status(), 500);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "CONFIGURATION_ERROR");
    // Generic message only; the detail stays in the server log.
    assert!(body["message"].as_str().unwrap().contains("contact support"));

    // No record was written and no files were stored.
    let conn = server.pool.connection();
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM appraisals", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 0);
}

#[actix_web::test]
async fn missing_required_photo_is_a_field_error() {
    let server = TestServer::new();
    let app = server.app().await;

    // Text fields only: every required slot should be reported.
    let text_fields = valid_text_fields();
    let parts: Vec<Part<'_>> = text_fields
        .iter()
        .map(|(k, v)| Part::Text(k.as_str(), v.as_str()))
        .collect();
    let resp = post_submission(&app, multipart_body(&parts)).await;
    assert_eq!(resp.status(), 422);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "VALIDATION_FAILED");
    let fields: Vec<&str> = body["fields"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["field"].as_str().unwrap())
        .collect();
    for slot in REQUIRED_SLOTS {
        assert!(fields.contains(slot), "missing error for {}", slot);
    }
}

#[actix_web::test]
async fn affirmative_answer_without_details_is_rejected() {
    let server = TestServer::new();
    let app = server.app().await;

    let mut text_fields = valid_text_fields();
    for (key, value) in text_fields.iter_mut() {
        if key == "accident_history_details" {
            *value = String::new();
        }
    }
    let mut parts: Vec<Part<'_>> = text_fields
        .iter()
        .map(|(k, v)| Part::Text(k.as_str(), v.as_str()))
        .collect();
    let photo = b"jpeg".to_vec();
    let filenames: Vec<String> = REQUIRED_SLOTS.iter().map(|s| format!("{}.jpg", s)).collect();
    for (&slot, filename) in REQUIRED_SLOTS.iter().zip(filenames.iter()) {
        parts.push(Part::File {
            name: slot,
            filename: filename.as_str(),
            content_type: "image/jpeg",
            bytes: &photo,
        });
    }

    let resp = post_submission(&app, multipart_body(&parts)).await;
    assert_eq!(resp.status(), 422);

    let body: Value = test::read_body_json(resp).await;
    assert!(body["fields"]
        .as_array()
        .unwrap()
        .iter()
        .any(|f| f["field"] == "accident_history_details"));
}

#[actix_web::test]
async fn optional_photo_without_description_is_rejected() {
    let server = TestServer::new();
    let app = server.app().await;

    let text_fields = valid_text_fields();
    let mut parts: Vec<Part<'_>> = text_fields
        .iter()
        .map(|(k, v)| Part::Text(k.as_str(), v.as_str()))
        .collect();
    let photo = b"jpeg".to_vec();
    let filenames: Vec<String> = REQUIRED_SLOTS.iter().map(|s| format!("{}.jpg", s)).collect();
    for (&slot, filename) in REQUIRED_SLOTS.iter().zip(filenames.iter()) {
        parts.push(Part::File {
            name: slot,
            filename: filename.as_str(),
            content_type: "image/jpeg",
            bytes: &photo,
        });
    }
    // A damage photo with no paired description.
    parts.push(Part::File {
        name: "damage1",
        filename: "scratch.jpg",
        content_type: "image/jpeg",
        bytes: &photo,
    });

    let resp = post_submission(&app, multipart_body(&parts)).await;
    assert_eq!(resp.status(), 422);

    let body: Value = test::read_body_json(resp).await;
    assert!(body["fields"]
        .as_array()
        .unwrap()
        .iter()
        .any(|f| f["field"] == "damage1_description"));
}

#[actix_web::test]
async fn wrong_content_type_is_rejected() {
    let server = TestServer::new();
    let app = server.app().await;

    let text_fields = valid_text_fields();
    let mut parts: Vec<Part<'_>> = text_fields
        .iter()
        .map(|(k, v)| Part::Text(k.as_str(), v.as_str()))
        .collect();
    let data = b"%PDF-1.4".to_vec();
    let filenames: Vec<String> = REQUIRED_SLOTS.iter().map(|s| format!("{}.pdf", s)).collect();
    for (&slot, filename) in REQUIRED_SLOTS.iter().zip(filenames.iter()) {
        parts.push(Part::File {
            name: slot,
            filename: filename.as_str(),
            content_type: "application/pdf",
            bytes: &data,
        });
    }

    let resp = post_submission(&app, multipart_body(&parts)).await;
    assert_eq!(resp.status(), 422);
}

#[actix_web::test]
async fn validation_failure_leaves_no_stored_files() {
    let server = TestServer::new();
    let app = server.app().await;

    let text_fields = valid_text_fields();
    let parts: Vec<Part<'_>> = text_fields
        .iter()
        .map(|(k, v)| Part::Text(k.as_str(), v.as_str()))
        .collect();
    let resp = post_submission(&app, multipart_body(&parts)).await;
    assert_eq!(resp.status(), 422);

    // Only the (empty) temp scratch area may remain under the data dir.
    let visible: Vec<_> = std::fs::read_dir(&server.config.data_dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| !e.file_name().to_string_lossy().starts_with('.'))
        .collect();
    assert!(visible.is_empty());
}

#[actix_web::test]
async fn detail_view_reports_not_found_for_unknown_id() {
    let server = TestServer::new();
    let app = server.app().await;

    // "abc123" is not even a UUID; still a not-found, never a crash.
    for id in ["abc123", "00000000-0000-4000-8000-000000000000"] {
        let req = test::TestRequest::get()
            .uri(&format!("/api/v1/appraisals/{}", id))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 404, "id {}", id);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "NOT_FOUND");
    }
}
