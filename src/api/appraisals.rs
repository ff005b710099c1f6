//! Appraisal submission and record viewing endpoints.

use std::sync::Arc;

use actix_multipart::Multipart;
use actix_web::{get, post, web, HttpResponse};
use tokio::sync::Semaphore;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::db::{appraisals, DbPool};
use crate::error::{AppError, AppResult};
use crate::models::{AppraisalDetailResponse, PhotoView, SubmitAppraisalResponse};
use crate::schema;
use crate::services::submission::{self, SubmissionContext};
use crate::services::Mailer;

/// Configure appraisal routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(submit_appraisal).service(get_appraisal);
}

/// Submit a completed appraisal form.
///
/// POST /appraisals
/// Content-Type: multipart/form-data
///
/// Text fields carry the questionnaire answers; file fields are keyed by
/// photo-slot name. The server re-runs the full validation regardless of
/// what the client checked.
#[utoipa::path(
    post,
    path = "/api/v1/appraisals",
    tag = "Appraisals",
    request_body(content = String, content_type = "multipart/form-data", description = "Appraisal form fields and photos"),
    responses(
        (status = 201, description = "Appraisal stored", body = SubmitAppraisalResponse),
        (status = 422, description = "Validation failed", body = crate::error::ValidationErrorResponse),
        (status = 500, description = "Configuration or storage failure", body = crate::error::ErrorResponse),
        (status = 503, description = "Too many concurrent uploads", body = crate::error::ErrorResponse)
    )
)]
#[post("/appraisals")]
pub async fn submit_appraisal(
    mut payload: Multipart,
    pool: web::Data<DbPool>,
    config: web::Data<Config>,
    mailer: web::Data<dyn Mailer>,
    upload_semaphore: web::Data<Arc<Semaphore>>,
) -> AppResult<HttpResponse> {
    // Notification configuration is checked before any side effect: a
    // submission that could never be announced is rejected outright.
    let email = config.email.as_ref().ok_or_else(|| {
        AppError::Configuration(
            "RESEND_API_KEY, APPRAISAL_FROM_EMAIL and APPRAISAL_TO_EMAIL must be set".to_string(),
        )
    })?;

    // Bound concurrent uploads to cap temp-file disk usage.
    let _permit = upload_semaphore.try_acquire().map_err(|_| {
        warn!("Submission rejected: too many concurrent uploads");
        AppError::ServiceUnavailable(
            "Too many concurrent uploads. Please try again later.".to_string(),
        )
    })?;

    let parsed =
        submission::parse_multipart(&mut payload, &config.data_dir, config.max_photo_size).await?;

    let ctx = SubmissionContext {
        pool: &pool,
        data_dir: &config.data_dir,
        public_base_url: &config.public_base_url,
        email,
        mailer: mailer.get_ref(),
        max_photo_size: config.max_photo_size,
    };

    let id = submission::finalize_submission(parsed, &ctx).await?;

    Ok(HttpResponse::Created().json(SubmitAppraisalResponse {
        submission_id: id,
        message: "Appraisal submitted successfully!".to_string(),
    }))
}

/// Get the full record and its resolved photos.
///
/// GET /appraisals/{id}
#[utoipa::path(
    get,
    path = "/api/v1/appraisals/{id}",
    tag = "Appraisals",
    params(
        ("id" = String, Path, description = "Submission identifier")
    ),
    responses(
        (status = 200, description = "Appraisal detail", body = AppraisalDetailResponse),
        (status = 404, description = "No such appraisal", body = crate::error::ErrorResponse)
    )
)]
#[get("/appraisals/{id}")]
pub async fn get_appraisal(
    pool: web::Data<DbPool>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let raw_id = path.into_inner();
    // A malformed identifier cannot name a record; report not-found rather
    // than a parse error.
    let id = Uuid::parse_str(&raw_id)
        .map_err(|_| AppError::NotFound(format!("Appraisal {}", raw_id)))?;

    let appraisal = {
        let conn = pool.connection();
        appraisals::get_appraisal_by_id(&conn, id)?
    }
    .ok_or_else(|| AppError::NotFound(format!("Appraisal {}", id)))?;

    // Resolve photos through the persisted manifest; slots without an entry
    // are omitted rather than erroring.
    let resolved_photos: Vec<PhotoView> = schema::PHOTO_SLOTS
        .iter()
        .filter_map(|slot| {
            appraisal.photos.get(slot.key).map(|photo| PhotoView {
                slot: slot.key.to_string(),
                label: slot.label.to_string(),
                path: format!("/uploads/{}/{}", id, photo.file),
                description: photo.description.clone(),
            })
        })
        .collect();

    info!("Serving appraisal {} ({} photos)", id, resolved_photos.len());

    Ok(HttpResponse::Ok().json(AppraisalDetailResponse {
        appraisal,
        resolved_photos,
    }))
}
